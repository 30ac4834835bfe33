//! Semantic side-table filled by the resolver.

use std::collections::{BTreeSet, HashMap};

use crate::arena::Handle;
use crate::attr::PipelineStage;
use crate::decl::{Function, Variable};
use crate::expr::Expression;
use crate::types::{AddressSpace, Type};

/// What an identifier or call expression refers to.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Resolved {
    Variable(Handle<Variable>),
    Function(Handle<Function>),
}

/// Facts about one function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionInfo {
    pub stage: Option<PipelineStage>,
    pub workgroup_size: Option<[u32; 3]>,
    /// User functions called, directly or transitively.
    pub callees: BTreeSet<Handle<Function>>,
    /// Module-scope variables referenced, directly or through callees.
    pub referenced_globals: BTreeSet<Handle<Variable>>,
}

impl FunctionInfo {
    pub fn is_entry_point(&self) -> bool {
        self.stage.is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SemInfo {
    pub(crate) expr_types: HashMap<Handle<Expression>, Handle<Type>>,
    pub(crate) resolved: HashMap<Handle<Expression>, Resolved>,
    pub(crate) var_types: HashMap<Handle<Variable>, Handle<Type>>,
    pub(crate) var_spaces: HashMap<Handle<Variable>, AddressSpace>,
    pub(crate) module_vars: BTreeSet<Handle<Variable>>,
    pub(crate) functions: HashMap<Handle<Function>, FunctionInfo>,
}

impl SemInfo {
    /// Resolved type of a value expression. `None` for `_` and for calls
    /// to functions without a return type.
    pub fn expr_type(&self, expr: Handle<Expression>) -> Option<Handle<Type>> {
        self.expr_types.get(&expr).copied()
    }

    /// Target of an identifier or user-function call.
    pub fn resolved(&self, expr: Handle<Expression>) -> Option<Resolved> {
        self.resolved.get(&expr).copied()
    }

    pub fn resolved_variable(&self, expr: Handle<Expression>) -> Option<Handle<Variable>> {
        match self.resolved(expr)? {
            Resolved::Variable(v) => Some(v),
            Resolved::Function(_) => None,
        }
    }

    /// Store type of a variable, declared or inferred.
    pub fn var_type(&self, var: Handle<Variable>) -> Option<Handle<Type>> {
        self.var_types.get(&var).copied()
    }

    /// Effective address space of a `var`.
    pub fn var_space(&self, var: Handle<Variable>) -> Option<AddressSpace> {
        self.var_spaces.get(&var).copied()
    }

    pub fn is_module_scope(&self, var: Handle<Variable>) -> bool {
        self.module_vars.contains(&var)
    }

    pub fn function(&self, function: Handle<Function>) -> Option<&FunctionInfo> {
        self.functions.get(&function)
    }
}
