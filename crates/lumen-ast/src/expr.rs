//! Expression nodes.

use std::fmt;

use crate::arena::Handle;
use crate::source::Span;
use crate::symbol::Symbol;
use crate::types::Type;

/// A literal constant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(f32),
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum UnaryOp {
    Negate,
    Not,
    Complement,
    /// `*p`
    Deref,
    /// `&v`
    AddressOf,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRight,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub span: Span,
    pub kind: ExpressionKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExpressionKind {
    Literal(Literal),
    Identifier(Symbol),
    /// The `_` on the left of a phony assignment.
    Phony,
    Unary {
        op: UnaryOp,
        expr: Handle<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Handle<Expression>,
        right: Handle<Expression>,
    },
    /// `base[index]`
    Index {
        base: Handle<Expression>,
        index: Handle<Expression>,
    },
    /// `base.member`, including vector swizzles.
    Member {
        base: Handle<Expression>,
        member: Symbol,
    },
    /// A call to a user or builtin function.
    Call {
        function: Symbol,
        arguments: Vec<Handle<Expression>>,
    },
    /// A type constructor such as `vec3<f32>(a, b, c)`.
    Construct {
        ty: Handle<Type>,
        arguments: Vec<Handle<Expression>>,
    },
    Bitcast {
        ty: Handle<Type>,
        expr: Handle<Expression>,
    },
}

impl ExpressionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Literal(_) => "Literal",
            Self::Identifier(_) => "Identifier",
            Self::Phony => "Phony",
            Self::Unary { .. } => "Unary",
            Self::Binary { .. } => "Binary",
            Self::Index { .. } => "Index",
            Self::Member { .. } => "Member",
            Self::Call { .. } => "Call",
            Self::Construct { .. } => "Construct",
            Self::Bitcast { .. } => "Bitcast",
        }
    }

    /// Direct child expressions, left to right.
    pub fn operands(&self) -> Vec<Handle<Expression>> {
        match self {
            Self::Literal(_) | Self::Identifier(_) | Self::Phony => vec![],
            Self::Unary { expr, .. } | Self::Bitcast { expr, .. } => vec![*expr],
            Self::Member { base, .. } => vec![*base],
            Self::Binary { left, right, .. } => vec![*left, *right],
            Self::Index { base, index } => vec![*base, *index],
            Self::Call { arguments, .. } | Self::Construct { arguments, .. } => arguments.clone(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}i"),
            Self::U32(v) => write!(f, "{v}u"),
            Self::F32(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}f"),
            Self::F32(v) => write!(f, "{v}f"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negate => "-",
            Self::Not => "!",
            Self::Complement => "~",
            Self::Deref => "*",
            Self::AddressOf => "&",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn operands_are_left_to_right() {
        let mut exprs = Arena::new();
        let base = exprs.append(Expression {
            span: Span::default(),
            kind: ExpressionKind::Literal(Literal::I32(1)),
        });
        let index = exprs.append(Expression {
            span: Span::default(),
            kind: ExpressionKind::Literal(Literal::U32(2)),
        });
        let kind = ExpressionKind::Index { base, index };
        assert_eq!(kind.operands(), vec![base, index]);
        assert_eq!(kind.name(), "Index");
    }

    #[test]
    fn literal_display() {
        assert_eq!(Literal::F32(1.0).to_string(), "1.0f");
        assert_eq!(Literal::F32(0.5).to_string(), "0.5f");
        assert_eq!(Literal::U32(7).to_string(), "7u");
        assert_eq!(Literal::Bool(false).to_string(), "false");
    }

    #[test]
    fn op_classes() {
        assert!(BinaryOp::LessEqual.is_comparison());
        assert!(BinaryOp::LogicalOr.is_logical());
        assert!(BinaryOp::Xor.is_bitwise());
        assert!(BinaryOp::ShiftRight.is_shift());
        assert!(!BinaryOp::Add.is_comparison());
    }
}
