//! Attributes (`@group(0)`, `@builtin(position)`, ...).

use std::fmt;

use crate::source::Span;
use crate::types::{Scalar, VectorSize};

/// Built-in shader inputs/outputs.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum BuiltIn {
    Position,
    VertexIndex,
    InstanceIndex,
    FrontFacing,
    FragDepth,
    SampleIndex,
    SampleMask,
    LocalInvocationId,
    LocalInvocationIndex,
    GlobalInvocationId,
    WorkgroupId,
    NumWorkgroups,
}

impl BuiltIn {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "position" => Self::Position,
            "vertex_index" => Self::VertexIndex,
            "instance_index" => Self::InstanceIndex,
            "front_facing" => Self::FrontFacing,
            "frag_depth" => Self::FragDepth,
            "sample_index" => Self::SampleIndex,
            "sample_mask" => Self::SampleMask,
            "local_invocation_id" => Self::LocalInvocationId,
            "local_invocation_index" => Self::LocalInvocationIndex,
            "global_invocation_id" => Self::GlobalInvocationId,
            "workgroup_id" => Self::WorkgroupId,
            "num_workgroups" => Self::NumWorkgroups,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::VertexIndex => "vertex_index",
            Self::InstanceIndex => "instance_index",
            Self::FrontFacing => "front_facing",
            Self::FragDepth => "frag_depth",
            Self::SampleIndex => "sample_index",
            Self::SampleMask => "sample_mask",
            Self::LocalInvocationId => "local_invocation_id",
            Self::LocalInvocationIndex => "local_invocation_index",
            Self::GlobalInvocationId => "global_invocation_id",
            Self::WorkgroupId => "workgroup_id",
            Self::NumWorkgroups => "num_workgroups",
        }
    }

    /// The value shape of this builtin: scalar, or vector of `size`.
    pub fn value_shape(self) -> (Scalar, Option<VectorSize>) {
        match self {
            Self::Position => (Scalar::F32, Some(VectorSize::Quad)),
            Self::FragDepth => (Scalar::F32, None),
            Self::FrontFacing => (Scalar::Bool, None),
            Self::VertexIndex
            | Self::InstanceIndex
            | Self::SampleIndex
            | Self::SampleMask
            | Self::LocalInvocationIndex => (Scalar::U32, None),
            Self::LocalInvocationId
            | Self::GlobalInvocationId
            | Self::WorkgroupId
            | Self::NumWorkgroups => (Scalar::U32, Some(VectorSize::Tri)),
        }
    }
}

/// Shader stage of an entry point.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum PipelineStage {
    Vertex,
    Fragment,
    Compute,
}

impl PipelineStage {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "vertex" => Self::Vertex,
            "fragment" => Self::Fragment,
            "compute" => Self::Compute,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub span: Span,
    pub kind: AttributeKind,
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum AttributeKind {
    Group(u32),
    Binding(u32),
    Location(u32),
    Builtin(BuiltIn),
    Stage(PipelineStage),
    WorkgroupSize([u32; 3]),
    Stride(u32),
    Invariant,
}

impl AttributeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Group(_) => "group",
            Self::Binding(_) => "binding",
            Self::Location(_) => "location",
            Self::Builtin(_) => "builtin",
            Self::Stage(_) => "stage",
            Self::WorkgroupSize(_) => "workgroup_size",
            Self::Stride(_) => "stride",
            Self::Invariant => "invariant",
        }
    }

    /// Attributes that describe pipeline IO (`@builtin`, `@location`,
    /// `@invariant`).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Builtin(_) | Self::Location(_) | Self::Invariant)
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        })
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(v) => write!(f, "@group({v})"),
            Self::Binding(v) => write!(f, "@binding({v})"),
            Self::Location(v) => write!(f, "@location({v})"),
            Self::Builtin(b) => write!(f, "@builtin({b})"),
            Self::Stage(s) => write!(f, "@{s}"),
            Self::WorkgroupSize([x, y, z]) => write!(f, "@workgroup_size({x}, {y}, {z})"),
            Self::Stride(v) => write!(f, "@stride({v})"),
            Self::Invariant => write!(f, "@invariant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_round_trip_names() {
        for name in ["position", "local_invocation_index", "global_invocation_id"] {
            let b = BuiltIn::parse(name).expect("known builtin");
            assert_eq!(b.as_str(), name);
        }
        assert_eq!(BuiltIn::parse("bogus"), None);
    }

    #[test]
    fn attribute_display() {
        assert_eq!(AttributeKind::WorkgroupSize([8, 8, 1]).to_string(), "@workgroup_size(8, 8, 1)");
        assert_eq!(AttributeKind::Stage(PipelineStage::Compute).to_string(), "@compute");
        assert!(AttributeKind::Builtin(BuiltIn::Position).is_io());
        assert!(!AttributeKind::Group(0).is_io());
    }
}
