//! Declarations: variables, functions, named types.

use crate::arena::Handle;
use crate::attr::Attribute;
use crate::expr::Expression;
use crate::source::Span;
use crate::stmt::Statement;
use crate::symbol::Symbol;
use crate::types::{Access, AddressSpace, Type};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum VariableKind {
    Var,
    Let,
    /// A function parameter.
    Param,
}

impl VariableKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Let => "let",
            Self::Param => "parameter",
        }
    }
}

/// A `var`, `let` or function parameter, at module or function scope.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub span: Span,
    pub name: Symbol,
    pub kind: VariableKind,
    /// The `<space>` of `var<space, access>`, when written.
    pub space: Option<AddressSpace>,
    pub access: Option<Access>,
    /// Declared type. Absent when inferred from `init`.
    pub ty: Option<Handle<Type>>,
    pub init: Option<Handle<Expression>>,
    pub attributes: Vec<Handle<Attribute>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub span: Span,
    pub name: Symbol,
    pub params: Vec<Handle<Variable>>,
    pub return_type: Option<Handle<Type>>,
    pub return_attributes: Vec<Handle<Attribute>>,
    /// Always a `Block`.
    pub body: Handle<Statement>,
    pub attributes: Vec<Handle<Attribute>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructMemberDecl {
    pub span: Span,
    pub name: Symbol,
    pub ty: Handle<Type>,
    pub attributes: Vec<Handle<Attribute>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDeclKind {
    /// `type A = B;` The alias is transparent: `ty` is the target.
    Alias,
    Struct { members: Vec<StructMemberDecl> },
}

/// A named type: `type` alias or `struct`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub span: Span,
    pub name: Symbol,
    pub ty: Handle<Type>,
    pub kind: TypeDeclKind,
}

/// One entry of the module-scope declaration list.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum GlobalDecl {
    Variable(Handle<Variable>),
    Function(Handle<Function>),
    Type(Handle<TypeDecl>),
}

impl GlobalDecl {
    pub fn as_variable(self) -> Option<Handle<Variable>> {
        match self {
            Self::Variable(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_function(self) -> Option<Handle<Function>> {
        match self {
            Self::Function(h) => Some(h),
            _ => None,
        }
    }
}
