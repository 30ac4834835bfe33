//! Removes phony assignments.

use lumen_ast::{
    CloneContext, Expression, ExpressionKind, Handle, Program, ProgramBuilder, StatementKind,
};

use crate::{Construct, DataMap, Output, Transform};

/// `_ = f(x);` becomes the call statement `f(x);`. Any other phony
/// assignment is dropped, keeping the calls inside its value as call
/// statements in evaluation order.
#[derive(Debug, Default)]
pub struct RemovePhonies;

impl Transform for RemovePhonies {
    fn name(&self) -> &str {
        "RemovePhonies"
    }

    fn finalizes(&self) -> &[Construct] {
        &[Construct::PhonyAssignment]
    }

    fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);

        let mut removed = 0usize;
        for (handle, stmt) in program.ast().statements.iter() {
            let StatementKind::Assign { lhs, rhs } = stmt.kind else {
                continue;
            };
            if !matches!(program[lhs].kind, ExpressionKind::Phony) {
                continue;
            }
            if matches!(program[rhs].kind, ExpressionKind::Call { .. }) {
                let call = ctx.clone_expr(rhs);
                let replacement = ctx.dst().stmt(stmt.span, StatementKind::Call(call));
                ctx.replace_stmt(handle, replacement);
            } else {
                let mut calls = Vec::new();
                collect_calls(program, rhs, &mut calls);
                for call in calls {
                    let span = program[call].span;
                    let call = ctx.clone_expr(call);
                    let kept = ctx.dst().stmt(span, StatementKind::Call(call));
                    ctx.insert_stmt_before(handle, kept);
                }
                ctx.remove_stmt(handle);
                removed += 1;
            }
        }
        log::debug!("removed {removed} phony assignment(s)");

        ctx.clone_program();
        Output::new(builder.build())
    }
}

/// Outermost calls under `expr`, left to right. Calls nested in a call's
/// arguments stay with that call.
fn collect_calls(program: &Program, expr: Handle<Expression>, calls: &mut Vec<Handle<Expression>>) {
    let kind = &program[expr].kind;
    if matches!(kind, ExpressionKind::Call { .. }) {
        calls.push(expr);
        return;
    }
    for operand in kind.operands() {
        collect_calls(program, operand, calls);
    }
}

#[cfg(test)]
mod tests {
    use lumen_ast::dump_program;
    use lumen_reader::parse;

    use super::*;

    #[test]
    fn calls_are_kept_and_values_dropped() {
        let program = parse(
            "fn g() -> i32 { return 1; }\n\
             fn f() {\n\
               let a = 2;\n\
               _ = a;\n\
               _ = g();\n\
               _ = a + g();\n\
             }",
        );
        program.ensure_valid().expect("source should parse");
        let out = RemovePhonies.run(&program, &DataMap::new()).program;
        assert!(out.is_valid(), "{}", out.diagnostics());
        let expected = "\
fn f() {
  let a = 2i;
  g();
  g();
}
";
        let dump = dump_program(&out);
        assert!(dump.ends_with(expected), "{dump}");
        assert_eq!(out.transforms_applied(), ["RemovePhonies"]);
    }

    #[test]
    fn nested_calls_survive_dropped_phonies() {
        let program = parse(
            "var<private> n: i32;\n\
             fn g() -> i32 { n = n + 1; return n; }\n\
             fn h(x: i32) -> i32 { return x; }\n\
             fn f() { _ = g() + 1; _ = -h(g()) * g(); }",
        );
        program.ensure_valid().expect("source should parse");
        let out = RemovePhonies.run(&program, &DataMap::new()).program;
        assert!(out.is_valid(), "{}", out.diagnostics());
        let expected = "\
fn f() {
  g();
  h(g());
  g();
}
";
        let dump = dump_program(&out);
        assert!(dump.ends_with(expected), "{dump}");
    }
}
