//! lumen abstract syntax tree.
//!
//! Arena-owned AST nodes, an interning symbol table and structural type
//! store, semantic resolution, and the clone/rewrite engine transforms use
//! to derive new programs from old ones.

pub mod arena;
mod attr;
mod clone;
mod decl;
mod diagnostic;
mod display;
mod error;
mod expr;
mod program;
mod resolver;
mod sem;
mod source;
mod stmt;
mod symbol;
mod types;

pub use arena::{Arena, Handle};
pub use attr::{Attribute, AttributeKind, BuiltIn, PipelineStage};
pub use clone::{CloneContext, clone_program};
pub use decl::{
    Function, GlobalDecl, StructMemberDecl, TypeDecl, TypeDeclKind, Variable, VariableKind,
};
pub use diagnostic::{Diagnostic, Diagnostics, Severity, System};
pub use display::{dump_program, format_expr};
pub use error::ProgramError;
pub use expr::{BinaryOp, Expression, ExpressionKind, Literal, UnaryOp};
pub use program::{Ast, Program, ProgramBuilder};
pub use sem::{FunctionInfo, Resolved, SemInfo};
pub use source::{Location, Span};
pub use stmt::{Statement, StatementKind};
pub use symbol::{Symbol, SymbolTable};
pub use types::{
    Access, AddressSpace, ArrayType, ImageFormat, Layout, SamplerKind, Scalar, StructMember,
    StructType, TextureDimension, TextureKind, TextureType, Type, TypeStore, VectorSize, round_up,
};
