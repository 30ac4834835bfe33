//! Zero-initializes workgroup storage at the start of compute entry points.

use lumen_ast::{
    AddressSpace, AttributeKind, BinaryOp, BuiltIn, CloneContext, ExpressionKind, Function, Handle,
    Literal, PipelineStage, Program, ProgramBuilder, Scalar, Span, StatementKind, Symbol, Type,
    UnaryOp, Variable, VariableKind,
};

use crate::{Construct, DataMap, Output, Transform};

/// Prepends to every compute entry point that uses `var<workgroup>`
/// storage:
///
/// ```text
/// if (local_invocation_index == 0u) {
///   tile = array<f32, 64>();
///   ...
/// }
/// workgroupBarrier();
/// ```
///
/// The `@builtin(local_invocation_index)` parameter is reused when the entry
/// point already declares one and added otherwise.
#[derive(Debug, Default)]
pub struct ZeroInitWorkgroupMemory;

impl Transform for ZeroInitWorkgroupMemory {
    fn name(&self) -> &str {
        "ZeroInitWorkgroupMemory"
    }

    fn introduces(&self) -> &[Construct] {
        &[Construct::EntryPointParameter]
    }

    fn finalizes(&self) -> &[Construct] {
        &[Construct::WorkgroupVariable]
    }

    fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);

        for entry in program.entry_points() {
            if program.ast().stage_of(entry) != Some(PipelineStage::Compute) {
                continue;
            }
            let Some(info) = program.sem().function(entry) else {
                continue;
            };
            let workgroup_vars: Vec<Handle<Variable>> = info
                .referenced_globals
                .iter()
                .copied()
                .filter(|&v| program.sem().var_space(v) == Some(AddressSpace::Workgroup))
                .collect();
            if workgroup_vars.is_empty() {
                continue;
            }
            log::debug!(
                "zero-initializing {} workgroup variable(s) in '{}'",
                workgroup_vars.len(),
                program.name_of(program[entry].name)
            );
            zero_init(&mut ctx, entry, &workgroup_vars);
        }

        ctx.clone_program();
        Output::new(builder.build())
    }
}

fn local_index_param(ctx: &mut CloneContext<'_>, entry: Handle<Function>) -> Symbol {
    let program = ctx.src();
    let existing = program[entry].params.iter().copied().find(|&p| {
        program.ast().find_attribute(&program[p].attributes, |k| {
            (*k == AttributeKind::Builtin(BuiltIn::LocalInvocationIndex)).then_some(())
        })
        .is_some()
    });
    if let Some(param) = existing {
        return ctx.clone_symbol(program[param].name);
    }

    let name = ctx.unique_symbol("local_invocation_index");
    let dst = ctx.dst();
    let ty = dst.types_mut().scalar(Scalar::U32);
    let attr = dst.attr(
        Span::default(),
        AttributeKind::Builtin(BuiltIn::LocalInvocationIndex),
    );
    let param = dst.var(Variable {
        span: Span::default(),
        name,
        kind: VariableKind::Param,
        space: None,
        access: None,
        ty: Some(ty),
        init: None,
        attributes: vec![attr],
    });
    ctx.insert_param_back(entry, param);
    name
}

fn zero_init(ctx: &mut CloneContext<'_>, entry: Handle<Function>, vars: &[Handle<Variable>]) {
    let program = ctx.src();
    let body = program[entry].body;
    let span = program[body].span;
    let index = local_index_param(ctx, entry);

    let mut stores = Vec::with_capacity(vars.len());
    for &var in vars {
        let name = ctx.clone_symbol(program[var].name);
        let Some(src_ty) = program.sem().var_type(var) else {
            continue;
        };
        let ty = ctx.clone_type(src_ty);
        let dst = ctx.dst();
        let atomic = match dst.types()[ty] {
            Type::Atomic(scalar) => Some(scalar),
            _ => None,
        };
        let target = dst.expr(span, ExpressionKind::Identifier(name));
        let stmt = match atomic {
            Some(scalar) => {
                let pointer = dst.expr(
                    span,
                    ExpressionKind::Unary {
                        op: UnaryOp::AddressOf,
                        expr: target,
                    },
                );
                let zero = dst.expr(span, ExpressionKind::Literal(zero_literal(scalar)));
                let store = dst.sym("atomicStore");
                let call = dst.expr(
                    span,
                    ExpressionKind::Call {
                        function: store,
                        arguments: vec![pointer, zero],
                    },
                );
                dst.stmt(span, StatementKind::Call(call))
            }
            None => {
                let zero = dst.expr(
                    span,
                    ExpressionKind::Construct {
                        ty,
                        arguments: Vec::new(),
                    },
                );
                dst.stmt(span, StatementKind::Assign { lhs: target, rhs: zero })
            }
        };
        stores.push(stmt);
    }

    let dst = ctx.dst();
    let index = dst.expr(span, ExpressionKind::Identifier(index));
    let first = dst.expr(span, ExpressionKind::Literal(Literal::U32(0)));
    let condition = dst.expr(
        span,
        ExpressionKind::Binary {
            op: BinaryOp::Equal,
            left: index,
            right: first,
        },
    );
    let accept = dst.stmt(span, StatementKind::Block(stores));
    let guard = dst.stmt(
        span,
        StatementKind::If {
            condition,
            accept,
            reject: None,
        },
    );
    let barrier = dst.sym("workgroupBarrier");
    let call = dst.expr(
        span,
        ExpressionKind::Call {
            function: barrier,
            arguments: Vec::new(),
        },
    );
    let barrier = dst.stmt(span, StatementKind::Call(call));

    ctx.insert_block_front(body, guard);
    ctx.insert_block_front(body, barrier);
}

fn zero_literal(scalar: Scalar) -> Literal {
    match scalar {
        Scalar::Bool => Literal::Bool(false),
        Scalar::I32 => Literal::I32(0),
        Scalar::U32 => Literal::U32(0),
        Scalar::F32 => Literal::F32(0.0),
    }
}

#[cfg(test)]
mod tests {
    use lumen_ast::dump_program;
    use lumen_reader::parse;

    use super::*;

    fn zero_init_dump(source: &str) -> String {
        let program = parse(source);
        program.ensure_valid().expect("source should parse");
        let out = ZeroInitWorkgroupMemory.run(&program, &DataMap::new()).program;
        assert!(out.is_valid(), "{}", out.diagnostics());
        dump_program(&out)
    }

    #[test]
    fn adds_local_index_parameter() {
        let dump = zero_init_dump(
            "var<workgroup> tile: array<f32, 4>;\n\
             var<workgroup> count: atomic<u32>;\n\
             @compute @workgroup_size(4)\n\
             fn main() { tile[0] = 1.0; atomicAdd(&count, 1u); }",
        );
        let expected = "\
@compute @workgroup_size(4, 1, 1)
fn main(@builtin(local_invocation_index) local_invocation_index: u32) {
  if ((local_invocation_index == 0u)) {
    tile = array<f32, 4>();
    atomicStore(&count, 0u);
  }
  workgroupBarrier();
  tile[0i] = 1.0f;
  atomicAdd(&count, 1u);
}
";
        assert!(dump.ends_with(expected), "{dump}");
    }

    #[test]
    fn reuses_existing_local_index() {
        let dump = zero_init_dump(
            "var<workgroup> total: i32;\n\
             @compute @workgroup_size(8)\n\
             fn main(@builtin(local_invocation_index) lid: u32) { total = 1; }",
        );
        assert!(
            dump.contains("fn main(@builtin(local_invocation_index) lid: u32) {"),
            "{dump}"
        );
        assert!(dump.contains("  if ((lid == 0u)) {\n    total = i32();\n  }"), "{dump}");
    }

    #[test]
    fn entry_points_without_workgroup_storage_are_untouched() {
        let source = "var<private> p: i32;\n@compute @workgroup_size(1)\nfn main() { p = 1; }";
        assert_eq!(zero_init_dump(source), dump_program(&parse(source)));
    }
}
