//! Statement nodes.

use crate::arena::Handle;
use crate::decl::Variable;
use crate::expr::Expression;
use crate::source::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub span: Span,
    pub kind: StatementKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StatementKind {
    /// `{ ... }`
    Block(Vec<Handle<Statement>>),
    /// A function-scope `var` or `let`.
    Variable(Handle<Variable>),
    /// `lhs = rhs;` where `lhs` may be a phony `_`.
    Assign {
        lhs: Handle<Expression>,
        rhs: Handle<Expression>,
    },
    /// A call evaluated for its side effects.
    Call(Handle<Expression>),
    If {
        condition: Handle<Expression>,
        /// Always a `Block`.
        accept: Handle<Statement>,
        /// A `Block`, or an `If` for `else if`.
        reject: Option<Handle<Statement>>,
    },
    Loop {
        body: Handle<Statement>,
        continuing: Option<Handle<Statement>>,
    },
    For {
        init: Option<Handle<Statement>>,
        condition: Option<Handle<Expression>>,
        update: Option<Handle<Statement>>,
        body: Handle<Statement>,
    },
    Break,
    Continue,
    Discard,
    Return(Option<Handle<Expression>>),
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Block(_) => "Block",
            Self::Variable(_) => "Variable",
            Self::Assign { .. } => "Assign",
            Self::Call(_) => "Call",
            Self::If { .. } => "If",
            Self::Loop { .. } => "Loop",
            Self::For { .. } => "For",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::Discard => "Discard",
            Self::Return(_) => "Return",
        }
    }

    /// The statements of a block; empty for any other statement.
    pub fn block_statements(&self) -> &[Handle<Statement>] {
        match self {
            Self::Block(stmts) => stmts,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn block_statements_of_non_block_is_empty() {
        let mut stmts = Arena::new();
        let brk = stmts.append(Statement {
            span: Span::default(),
            kind: StatementKind::Break,
        });
        let block = StatementKind::Block(vec![brk]);
        assert_eq!(block.block_statements(), &[brk]);
        assert!(StatementKind::Continue.block_statements().is_empty());
        assert_eq!(StatementKind::Discard.name(), "Discard");
    }
}
