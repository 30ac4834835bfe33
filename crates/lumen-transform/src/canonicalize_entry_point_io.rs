//! Moves entry-point IO parameters into a single input structure.

use std::collections::{BTreeMap, HashMap};

use lumen_ast::{
    CloneContext, ExpressionKind, GlobalDecl, Handle, Program, ProgramBuilder, StructMemberDecl,
    Symbol, Type, TypeDecl, TypeDeclKind, Variable, VariableKind,
};

use crate::{Construct, DataMap, Output, Transform};

/// Output of [`CanonicalizeEntryPointIO`]: for each rewritten entry point,
/// the name of its synthesized input structure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CanonicalizedEntryPoints {
    pub inputs: BTreeMap<String, String>,
}

/// Rewrites
///
/// ```text
/// @fragment fn fs(@location(0) color: vec4<f32>) -> ... { use(color); }
/// ```
///
/// into
///
/// ```text
/// struct fs_inputs { @location(0) color: vec4<f32>, };
/// @fragment fn fs(inputs: fs_inputs) -> ... { use(inputs.color); }
/// ```
///
/// Parameters that already are structures are left in place after the new
/// one.
#[derive(Debug, Default)]
pub struct CanonicalizeEntryPointIO;

impl Transform for CanonicalizeEntryPointIO {
    fn name(&self) -> &str {
        "CanonicalizeEntryPointIO"
    }

    fn finalizes(&self) -> &[Construct] {
        &[Construct::EntryPointParameter]
    }

    fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);
        let mut result = CanonicalizedEntryPoints::default();

        let mut members: HashMap<Handle<Variable>, Symbol> = HashMap::new();
        let mut inputs_name = None;
        for entry in program.entry_points() {
            let io_params: Vec<Handle<Variable>> = program[entry]
                .params
                .iter()
                .copied()
                .filter(|&p| is_io_param(program, p))
                .collect();
            if io_params.is_empty() {
                continue;
            }
            let inputs = *inputs_name.get_or_insert_with(|| ctx.unique_symbol("inputs"));

            let entry_name = program.name_of(program[entry].name);
            let struct_name = ctx.unique_symbol(&format!("{entry_name}_inputs"));
            let mut fields = Vec::with_capacity(io_params.len());
            let mut decls = Vec::with_capacity(io_params.len());
            for &param in &io_params {
                let var = &program[param];
                let name = ctx.clone_symbol(var.name);
                let Some(ty) = var.ty.map(|t| ctx.clone_type(t)) else {
                    continue;
                };
                let attributes = var.attributes.iter().map(|&a| ctx.clone_attr(a)).collect();
                fields.push((name, ty));
                decls.push(StructMemberDecl {
                    span: var.span,
                    name,
                    ty,
                    attributes,
                });
                members.insert(param, name);
                ctx.remove_var(param);
            }

            let span = program[entry].span;
            let dst = ctx.dst();
            let ty = dst.types_mut().structure(struct_name, &fields);
            let decl = dst.type_decl(TypeDecl {
                span,
                name: struct_name,
                ty,
                kind: TypeDeclKind::Struct { members: decls },
            });
            let param = dst.var(Variable {
                span,
                name: inputs,
                kind: VariableKind::Param,
                space: None,
                access: None,
                ty: Some(ty),
                init: None,
                attributes: Vec::new(),
            });
            ctx.insert_global_before(GlobalDecl::Function(entry), GlobalDecl::Type(decl));
            ctx.insert_param_front(entry, param);

            log::debug!(
                "moved {} parameter(s) of '{entry_name}' into a structure",
                io_params.len()
            );
            result.inputs.insert(
                entry_name.to_owned(),
                ctx.dst().symbols().name_for(struct_name).to_owned(),
            );
        }

        if let Some(inputs) = inputs_name {
            for (handle, expr) in program.ast().expressions.iter() {
                if !matches!(expr.kind, ExpressionKind::Identifier(_)) {
                    continue;
                }
                let Some(member) = program
                    .sem()
                    .resolved_variable(handle)
                    .and_then(|v| members.get(&v).copied())
                else {
                    continue;
                };
                let dst = ctx.dst();
                let base = dst.expr(expr.span, ExpressionKind::Identifier(inputs));
                let access = dst.expr(expr.span, ExpressionKind::Member { base, member });
                ctx.replace_expr(handle, access);
            }
        }

        ctx.clone_program();
        let mut output = Output::new(builder.build());
        output.data.add(result);
        output
    }
}

/// A parameter carrying `@builtin`/`@location` that is not a structure.
fn is_io_param(program: &Program, param: Handle<Variable>) -> bool {
    let var = &program[param];
    let Some(ty) = var.ty else {
        return false;
    };
    !matches!(program.types()[ty], Type::Struct(_))
        && var.attributes.iter().any(|&a| program[a].kind.is_io())
}

#[cfg(test)]
mod tests {
    use lumen_ast::dump_program;
    use lumen_reader::parse;

    use super::*;

    fn canonicalize(source: &str) -> Output {
        let program = parse(source);
        program.ensure_valid().expect("source should parse");
        let out = CanonicalizeEntryPointIO.run(&program, &DataMap::new());
        assert!(out.program.is_valid(), "{}", out.program.diagnostics());
        out
    }

    #[test]
    fn parameters_become_members() {
        let out = canonicalize(
            "@fragment\n\
             fn fs(@location(0) color: vec4<f32>, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {\n\
               if (front) { return color; }\n\
               return -color;\n\
             }",
        );
        let dump = dump_program(&out.program);
        let expected = "\
struct fs_inputs {
  @location(0) color: vec4<f32>,
  @builtin(front_facing) front: bool,
};

@fragment
fn fs(inputs: fs_inputs) -> @location(0) vec4<f32> {
  if (inputs.front) {
    return inputs.color;
  }
  return -inputs.color;
}
";
        assert_eq!(dump, expected);

        let result = out
            .data
            .get::<CanonicalizedEntryPoints>()
            .expect("result published");
        assert_eq!(result.inputs.get("fs").map(String::as_str), Some("fs_inputs"));
    }

    #[test]
    fn struct_parameters_are_kept() {
        let out = canonicalize(
            "struct In { @location(0) v: f32, };\n\
             @fragment\n\
             fn fs(s: In, @builtin(position) pos: vec4<f32>) -> @location(0) f32 { return s.v + pos.x; }",
        );
        let dump = dump_program(&out.program);
        assert!(dump.contains("fn fs(inputs: fs_inputs, s: In) -> @location(0) f32 {"), "{dump}");
        assert!(dump.contains("return (s.v + inputs.pos.x);"), "{dump}");
    }

    #[test]
    fn existing_names_are_avoided() {
        let out = canonicalize(
            "struct main_inputs { a: u32, };\n\
             @compute @workgroup_size(1)\n\
             fn main(@builtin(local_invocation_index) inputs: u32) { let x = inputs; }",
        );
        let dump = dump_program(&out.program);
        assert!(dump.contains("struct main_inputs_1 {"), "{dump}");
        assert!(dump.contains("fn main(inputs_1: main_inputs_1) {"), "{dump}");
        assert!(dump.contains("let x = inputs_1.inputs;"), "{dump}");
    }

    #[test]
    fn entry_points_without_io_are_untouched() {
        let source = "@compute @workgroup_size(1)\nfn main() {}";
        let out = canonicalize(source);
        assert_eq!(dump_program(&out.program), dump_program(&parse(source)));
        let result = out
            .data
            .get::<CanonicalizedEntryPoints>()
            .expect("result published");
        assert!(result.inputs.is_empty());
    }
}
