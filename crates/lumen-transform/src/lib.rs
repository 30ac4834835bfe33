//! Program-to-program transforms for lumen.
//!
//! Provides a [`Transform`] trait, a type-keyed [`DataMap`] for transform
//! configuration and results, a [`Manager`] that runs transforms in order
//! and stops at the first failure, and the built-in transforms that prepare
//! a program for a GLSL-style backend.

mod add_empty_entry_point;
mod binding_remapper;
mod canonicalize_entry_point_io;
mod data;
mod glsl;
mod manager;
mod remove_phonies;
mod single_entry_point;
mod unshadow;
mod zero_init_workgroup_memory;

pub use add_empty_entry_point::AddEmptyEntryPoint;
pub use binding_remapper::{
    BindingPoint, BindingPointParseError, BindingRemapper, BindingRemapperRemappings,
};
pub use canonicalize_entry_point_io::{CanonicalizeEntryPointIO, CanonicalizedEntryPoints};
pub use data::DataMap;
pub use glsl::{Glsl, GlslConfig};
pub use manager::{Manager, OrderError, PipelineError, PipelineOutput};
pub use remove_phonies::RemovePhonies;
pub use single_entry_point::{SingleEntryPoint, SingleEntryPointConfig};
pub use unshadow::Unshadow;
pub use zero_init_workgroup_memory::ZeroInitWorkgroupMemory;

use std::fmt::{self, Debug};

use lumen_ast::Program;

/// Kinds of program construct whose presence constrains transform order.
///
/// A transform that *finalizes* a construct leaves none behind for later
/// transforms to handle; a transform that *introduces* one must therefore
/// run before any transform finalizing it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Construct {
    /// Entry-point parameters carrying IO attributes.
    EntryPointParameter,
    /// Entry-point functions.
    EntryPoint,
    /// `_ = expr;` assignments.
    PhonyAssignment,
    /// Function-scope names that hide module-scope declarations.
    ShadowedName,
    /// Uninitialized `var<workgroup>` storage.
    WorkgroupVariable,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EntryPointParameter => "entry point parameter",
            Self::EntryPoint => "entry point",
            Self::PhonyAssignment => "phony assignment",
            Self::ShadowedName => "shadowed name",
            Self::WorkgroupVariable => "workgroup variable",
        })
    }
}

/// Result of running a [`Transform`].
#[derive(Debug)]
pub struct Output {
    /// The new program. Invalid when the transform failed.
    pub program: Program,
    /// Results published for later transforms and the caller.
    pub data: DataMap,
}

impl Output {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            data: DataMap::new(),
        }
    }
}

/// A pass that derives a new program from an existing one.
///
/// Transforms never modify their input. They build the output through a
/// [`CloneContext`](lumen_ast::CloneContext) and record themselves with
/// [`mark_transform_applied`](lumen_ast::ProgramBuilder::mark_transform_applied).
pub trait Transform: Debug {
    /// Human-readable name of the transform.
    fn name(&self) -> &str;

    /// Constructs this transform may add to a program.
    fn introduces(&self) -> &[Construct] {
        &[]
    }

    /// Constructs guaranteed absent from this transform's output.
    fn finalizes(&self) -> &[Construct] {
        &[]
    }

    /// Runs the transform on a valid program.
    fn run(&self, program: &Program, inputs: &DataMap) -> Output;
}
