//! The [`Program`] arena and its [`ProgramBuilder`].

use std::ops::Index;

use crate::arena::{Arena, Handle};
use crate::attr::{Attribute, AttributeKind, PipelineStage};
use crate::decl::{Function, GlobalDecl, TypeDecl, Variable};
use crate::diagnostic::Diagnostics;
use crate::error::ProgramError;
use crate::expr::{Expression, ExpressionKind};
use crate::resolver::Resolver;
use crate::sem::SemInfo;
use crate::source::Span;
use crate::stmt::{Statement, StatementKind};
use crate::symbol::{Symbol, SymbolTable};
use crate::types::TypeStore;

/// Node storage of one compilation unit, one arena per node category.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    pub expressions: Arena<Expression>,
    pub statements: Arena<Statement>,
    pub variables: Arena<Variable>,
    pub functions: Arena<Function>,
    pub type_decls: Arena<TypeDecl>,
    pub attributes: Arena<Attribute>,
    /// Module-scope declarations in source order.
    pub globals: Vec<GlobalDecl>,
}

macro_rules! ast_index {
    ($($node:ty => $field:ident,)*) => {
        $(
            impl Index<Handle<$node>> for Ast {
                type Output = $node;

                fn index(&self, handle: Handle<$node>) -> &$node {
                    &self.$field[handle]
                }
            }
        )*
    };
}

ast_index! {
    Expression => expressions,
    Statement => statements,
    Variable => variables,
    Function => functions,
    TypeDecl => type_decls,
    Attribute => attributes,
}

impl Ast {
    /// Finds the first attribute of `attrs` matching `pick`.
    pub fn find_attribute<R>(
        &self,
        attrs: &[Handle<Attribute>],
        pick: impl Fn(&AttributeKind) -> Option<R>,
    ) -> Option<R> {
        attrs.iter().find_map(|&a| pick(&self.attributes[a].kind))
    }

    /// The `@vertex`/`@fragment`/`@compute` stage of a function.
    pub fn stage_of(&self, function: Handle<Function>) -> Option<PipelineStage> {
        self.find_attribute(&self.functions[function].attributes, |k| match k {
            AttributeKind::Stage(s) => Some(*s),
            _ => None,
        })
    }
}

/// A compilation unit: AST, symbols, types, semantic info and diagnostics.
///
/// Programs are immutable once built. Transforms produce new ones through
/// [`CloneContext`](crate::CloneContext).
#[derive(Clone, Debug, Default)]
pub struct Program {
    ast: Ast,
    symbols: SymbolTable,
    types: TypeStore,
    sem: SemInfo,
    diagnostics: Diagnostics,
    transforms_applied: Vec<String>,
    source_name: Option<String>,
    valid: bool,
}

impl Program {
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn types(&self) -> &TypeStore {
        &self.types
    }

    pub fn sem(&self) -> &SemInfo {
        &self.sem
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// `false` once any error diagnostic exists. Invalid programs must not
    /// be resolved, transformed or handed to a code generator.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Fails with the program's diagnostics unless it is valid.
    pub fn ensure_valid(&self) -> Result<(), ProgramError> {
        if self.valid {
            Ok(())
        } else {
            Err(ProgramError::Invalid {
                count: self.diagnostics.error_count(),
                diagnostics: self.diagnostics.clone(),
            })
        }
    }

    /// Names of the transforms that produced this program, oldest first.
    pub fn transforms_applied(&self) -> &[String] {
        &self.transforms_applied
    }

    pub fn has_transform_applied(&self, name: &str) -> bool {
        self.transforms_applied.iter().any(|t| t == name)
    }

    /// File name the program was read from, if any.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn globals(&self) -> &[GlobalDecl] {
        &self.ast.globals
    }

    /// Text of `symbol`.
    pub fn name_of(&self, symbol: Symbol) -> &str {
        self.symbols.name_for(symbol)
    }

    /// Functions carrying a pipeline-stage attribute, in declaration order.
    pub fn entry_points(&self) -> Vec<Handle<Function>> {
        self.ast
            .globals
            .iter()
            .filter_map(|g| g.as_function())
            .filter(|&f| self.ast.stage_of(f).is_some())
            .collect()
    }

    /// Module-scope function named `name`.
    pub fn find_function(&self, name: &str) -> Option<Handle<Function>> {
        let sym = self.symbols.get(name)?;
        self.ast
            .globals
            .iter()
            .filter_map(|g| g.as_function())
            .find(|&f| self.ast.functions[f].name == sym)
    }
}

impl<T> Index<Handle<T>> for Program
where
    Ast: Index<Handle<T>, Output = T>,
{
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &self.ast[handle]
    }
}

/// Accumulates nodes for a new [`Program`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    ast: Ast,
    symbols: SymbolTable,
    types: TypeStore,
    diagnostics: Diagnostics,
    transforms_applied: Vec<String>,
    source_name: Option<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn types(&self) -> &TypeStore {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeStore {
        &mut self.types
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.source_name = Some(name.into());
    }

    /// Records that transform `name` contributed to this program.
    pub fn mark_transform_applied(&mut self, name: &str) {
        self.transforms_applied.push(name.to_owned());
    }

    /// Carries over the source name, transform history and diagnostics of
    /// the program this one is derived from. Inherited entries come first.
    pub(crate) fn inherit(&mut self, src: &Program) {
        if self.source_name.is_none() {
            self.source_name = src.source_name.clone();
        }
        let mut applied = src.transforms_applied.clone();
        applied.append(&mut self.transforms_applied);
        self.transforms_applied = applied;

        let mut diagnostics = src.diagnostics.clone();
        diagnostics.extend(&self.diagnostics);
        self.diagnostics = diagnostics;
    }

    /// Interns `name`.
    pub fn sym(&mut self, name: &str) -> Symbol {
        self.symbols.register(name)
    }

    pub fn expr(&mut self, span: Span, kind: ExpressionKind) -> Handle<Expression> {
        self.ast.expressions.append(Expression { span, kind })
    }

    pub fn stmt(&mut self, span: Span, kind: StatementKind) -> Handle<Statement> {
        self.ast.statements.append(Statement { span, kind })
    }

    pub fn attr(&mut self, span: Span, kind: AttributeKind) -> Handle<Attribute> {
        self.ast.attributes.append(Attribute { span, kind })
    }

    pub fn var(&mut self, var: Variable) -> Handle<Variable> {
        self.ast.variables.append(var)
    }

    pub fn function(&mut self, function: Function) -> Handle<Function> {
        self.ast.functions.append(function)
    }

    pub fn type_decl(&mut self, decl: TypeDecl) -> Handle<TypeDecl> {
        self.ast.type_decls.append(decl)
    }

    pub fn push_global(&mut self, decl: GlobalDecl) {
        self.ast.globals.push(decl);
    }

    /// Finishes the program. Semantic resolution runs only when no error
    /// has been recorded so far; the result is valid iff it adds none.
    pub fn build(self) -> Program {
        let Self {
            ast,
            symbols,
            mut types,
            mut diagnostics,
            transforms_applied,
            source_name,
        } = self;

        let sem = if diagnostics.contains_errors() {
            SemInfo::default()
        } else {
            Resolver::new(&ast, &symbols, &mut types, &mut diagnostics).resolve()
        };
        let valid = !diagnostics.contains_errors();
        if !valid {
            log::debug!("program built with {} error(s)", diagnostics.error_count());
        }

        Program {
            ast,
            symbols,
            types,
            sem,
            diagnostics,
            transforms_applied,
            source_name,
            valid,
        }
    }
}

impl<T> Index<Handle<T>> for ProgramBuilder
where
    Ast: Index<Handle<T>, Output = T>,
{
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        &self.ast[handle]
    }
}
