//! Rewrites resource binding points and storage access modes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lumen_ast::{
    Access, AddressSpace, Attribute, AttributeKind, CloneContext, GlobalDecl, Handle, Program,
    ProgramBuilder, System, Variable,
};

use crate::{DataMap, Output, Transform};

/// A `@group(G) @binding(B)` pair.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BindingPoint {
    pub group: u32,
    pub binding: u32,
}

impl BindingPoint {
    pub const fn new(group: u32, binding: u32) -> Self {
        Self { group, binding }
    }
}

/// Formats as `G:B`.
impl fmt::Display for BindingPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.binding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingPointParseError {
    #[error("expected '<group>:<binding>', found '{0}'")]
    Format(String),
    #[error("invalid {what} number '{text}'")]
    Number { what: &'static str, text: String },
}

impl FromStr for BindingPoint {
    type Err = BindingPointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, binding) = s
            .split_once(':')
            .ok_or_else(|| BindingPointParseError::Format(s.to_owned()))?;
        let number = |what: &'static str, text: &str| {
            text.trim()
                .parse::<u32>()
                .map_err(|_| BindingPointParseError::Number {
                    what,
                    text: text.to_owned(),
                })
        };
        Ok(Self {
            group: number("group", group)?,
            binding: number("binding", binding)?,
        })
    }
}

/// Input of [`BindingRemapper`]. Both tables are keyed by the binding point
/// as written in the source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingRemapperRemappings {
    pub binding_points: BTreeMap<BindingPoint, BindingPoint>,
    pub access_controls: BTreeMap<BindingPoint, Access>,
    /// Accept two resources ending up at the same binding point.
    pub allow_collisions: bool,
}

/// Moves resources to new binding points and overrides the access mode of
/// storage buffers. Without a [`BindingRemapperRemappings`] input the
/// program is copied unchanged.
#[derive(Debug, Default)]
pub struct BindingRemapper;

struct Resource {
    var: Handle<Variable>,
    point: BindingPoint,
    remapped: bool,
}

impl Transform for BindingRemapper {
    fn name(&self) -> &str {
        "BindingRemapper"
    }

    fn run(&self, program: &Program, inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);

        let Some(remappings) = inputs.get::<BindingRemapperRemappings>() else {
            ctx.clone_program();
            return Output::new(builder.build());
        };

        let mut resources = Vec::new();
        let mut access_changes = Vec::new();
        for var in program.globals().iter().filter_map(|g| g.as_variable()) {
            let Some((group_attr, binding_attr, point)) = binding_of(program, var) else {
                continue;
            };

            let target = remappings.binding_points.get(&point).copied();
            if let Some(to) = target {
                if to.group != point.group {
                    replace_attr(&mut ctx, group_attr, AttributeKind::Group(to.group));
                }
                if to.binding != point.binding {
                    replace_attr(&mut ctx, binding_attr, AttributeKind::Binding(to.binding));
                }
            }

            if let Some(&access) = remappings.access_controls.get(&point) {
                let space = program.sem().var_space(var);
                if space == Some(AddressSpace::Storage) {
                    if program[var].access != Some(access) {
                        access_changes.push((var, access));
                    }
                } else {
                    let space = space.map_or_else(|| "unknown".to_owned(), |s| s.to_string());
                    ctx.dst().diagnostics_mut().add_error(
                        System::Transform,
                        program[var].span,
                        format!(
                            "cannot apply access control to '{}': variable is in the '{space}' address space",
                            program.name_of(program[var].name)
                        ),
                    );
                }
            }

            resources.push(Resource {
                var,
                point: target.unwrap_or(point),
                remapped: target.is_some(),
            });
        }

        if !remappings.allow_collisions {
            report_collisions(&mut ctx, &resources);
        }

        for (var, access) in access_changes {
            let src = &program[var];
            let name = ctx.clone_symbol(src.name);
            let ty = src.ty.map(|t| ctx.clone_type(t));
            let init = src.init.map(|e| ctx.clone_expr(e));
            let attributes = src.attributes.iter().map(|&a| ctx.clone_attr(a)).collect();
            let replacement = ctx.dst().var(Variable {
                name,
                access: Some(access),
                ty,
                init,
                attributes,
                ..src.clone()
            });
            ctx.replace_var(var, replacement);
        }

        log::debug!(
            "remapped {} of {} resource(s)",
            resources.iter().filter(|r| r.remapped).count(),
            resources.len()
        );
        ctx.clone_program();
        Output::new(builder.build())
    }
}

/// The `@group` and `@binding` attributes of a module-scope variable.
fn binding_of(
    program: &Program,
    var: Handle<Variable>,
) -> Option<(Handle<Attribute>, Handle<Attribute>, BindingPoint)> {
    let attrs = &program[var].attributes;
    let (group_attr, group) = attrs.iter().find_map(|&a| match program[a].kind {
        AttributeKind::Group(g) => Some((a, g)),
        _ => None,
    })?;
    let (binding_attr, binding) = attrs.iter().find_map(|&a| match program[a].kind {
        AttributeKind::Binding(b) => Some((a, b)),
        _ => None,
    })?;
    Some((group_attr, binding_attr, BindingPoint::new(group, binding)))
}

fn replace_attr(ctx: &mut CloneContext<'_>, attr: Handle<Attribute>, kind: AttributeKind) {
    let span = ctx.src()[attr].span;
    let replacement = ctx.dst().attr(span, kind);
    ctx.replace_attr(attr, replacement);
}

/// Two resources sharing a binding point is an error once either of them
/// has been moved there.
fn report_collisions(ctx: &mut CloneContext<'_>, resources: &[Resource]) {
    let program = ctx.src();
    let mut first_at: BTreeMap<BindingPoint, &Resource> = BTreeMap::new();
    for resource in resources {
        match first_at.get(&resource.point) {
            Some(&first) if first.remapped || resource.remapped => {
                let message = format!(
                    "binding point {} of '{}' collides with '{}'",
                    resource.point,
                    program.name_of(program[resource.var].name),
                    program.name_of(program[first.var].name)
                );
                ctx.dst().diagnostics_mut().add_error(
                    System::Transform,
                    program[resource.var].span,
                    message,
                );
            }
            Some(_) => {}
            None => {
                first_at.insert(resource.point, resource);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lumen_ast::dump_program;
    use lumen_reader::parse;

    use super::*;

    const SOURCE: &str = "\
@group(0) @binding(0) var<storage, read_write> a: array<f32>;
@group(0) @binding(1) var<storage, read_write> b: array<f32>;
@group(1) @binding(0) var<uniform> u: vec4<f32>;
@compute @workgroup_size(1)
fn main() { a[0] = b[0] + u.x; }
";

    fn remap(remappings: BindingRemapperRemappings) -> Program {
        let program = parse(SOURCE);
        program.ensure_valid().expect("source should parse");
        let mut inputs = DataMap::new();
        inputs.add(remappings);
        BindingRemapper.run(&program, &inputs).program
    }

    #[test]
    fn binding_point_text() {
        assert_eq!("2:7".parse::<BindingPoint>(), Ok(BindingPoint::new(2, 7)));
        assert_eq!(BindingPoint::new(2, 7).to_string(), "2:7");
        assert_eq!(
            "2".parse::<BindingPoint>(),
            Err(BindingPointParseError::Format("2".to_owned()))
        );
        assert_eq!(
            "x:1".parse::<BindingPoint>().map_err(|e| e.to_string()),
            Err("invalid group number 'x'".to_owned())
        );
    }

    #[test]
    fn remaps_points_and_access() {
        let mut remappings = BindingRemapperRemappings::default();
        remappings
            .binding_points
            .insert(BindingPoint::new(0, 1), BindingPoint::new(2, 5));
        remappings
            .access_controls
            .insert(BindingPoint::new(0, 0), Access::Read);
        let out = remap(remappings);
        assert!(out.is_valid(), "{}", out.diagnostics());
        let dump = dump_program(&out);
        assert!(dump.contains("@group(0) @binding(0) var<storage, read> a: array<f32>;"), "{dump}");
        assert!(dump.contains("@group(2) @binding(5) var<storage, read_write> b: array<f32>;"), "{dump}");
        assert!(dump.contains("@group(1) @binding(0) var<uniform> u: vec4<f32>;"), "{dump}");
    }

    #[test]
    fn collisions_are_errors_unless_allowed() {
        let mut remappings = BindingRemapperRemappings::default();
        remappings
            .binding_points
            .insert(BindingPoint::new(0, 1), BindingPoint::new(0, 0));
        let out = remap(remappings.clone());
        assert!(!out.is_valid());
        assert_eq!(
            out.diagnostics().to_string(),
            "2:1: binding point 0:0 of 'b' collides with 'a'"
        );

        remappings.allow_collisions = true;
        let out = remap(remappings);
        assert!(out.is_valid(), "{}", out.diagnostics());
    }

    #[test]
    fn access_control_on_uniform_is_an_error() {
        let mut remappings = BindingRemapperRemappings::default();
        remappings
            .access_controls
            .insert(BindingPoint::new(1, 0), Access::Write);
        let out = remap(remappings);
        assert_eq!(
            out.diagnostics().to_string(),
            "3:1: cannot apply access control to 'u': variable is in the 'uniform' address space"
        );
    }

    #[test]
    fn missing_input_copies_program() {
        let program = parse(SOURCE);
        let out = BindingRemapper.run(&program, &DataMap::new()).program;
        assert!(out.is_valid());
        assert_eq!(dump_program(&out), dump_program(&program));
    }
}
