//! Renames function-scope declarations that hide module-scope names.

use std::collections::{HashMap, HashSet};

use lumen_ast::{
    CloneContext, ExpressionKind, GlobalDecl, Handle, Program, ProgramBuilder, Symbol, Variable,
};

use crate::{Construct, DataMap, Output, Transform};

/// Gives every local variable or parameter that shadows a module-scope
/// variable, function or type a fresh `<name>_<n>` name.
#[derive(Debug, Default)]
pub struct Unshadow;

impl Transform for Unshadow {
    fn name(&self) -> &str {
        "Unshadow"
    }

    fn finalizes(&self) -> &[Construct] {
        &[Construct::ShadowedName]
    }

    fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
        let ast = program.ast();
        let module_names: HashSet<Symbol> = program
            .globals()
            .iter()
            .map(|&decl| match decl {
                GlobalDecl::Variable(v) => program[v].name,
                GlobalDecl::Function(f) => program[f].name,
                GlobalDecl::Type(t) => program[t].name,
            })
            .collect();

        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);

        let mut renamed: HashMap<Handle<Variable>, Symbol> = HashMap::new();
        let mut order = Vec::new();
        for (handle, var) in ast.variables.iter() {
            if program.sem().is_module_scope(handle) || !module_names.contains(&var.name) {
                continue;
            }
            let name = ctx.unique_symbol(program.name_of(var.name));
            renamed.insert(handle, name);
            order.push(handle);
        }
        if renamed.is_empty() {
            ctx.clone_program();
            return Output::new(builder.build());
        }
        log::debug!("unshadowing {} declaration(s)", renamed.len());

        // References first, so initializers cloned below already see them.
        for (handle, expr) in ast.expressions.iter() {
            if !matches!(expr.kind, ExpressionKind::Identifier(_)) {
                continue;
            }
            if let Some(var) = program.sem().resolved_variable(handle)
                && let Some(&name) = renamed.get(&var)
            {
                let replacement = ctx.dst().expr(expr.span, ExpressionKind::Identifier(name));
                ctx.replace_expr(handle, replacement);
            }
        }

        for handle in order {
            let var = &program[handle];
            let ty = var.ty.map(|t| ctx.clone_type(t));
            let init = var.init.map(|e| ctx.clone_expr(e));
            let attributes = var.attributes.iter().map(|&a| ctx.clone_attr(a)).collect();
            let replacement = ctx.dst().var(Variable {
                span: var.span,
                name: renamed[&handle],
                kind: var.kind,
                space: var.space,
                access: var.access,
                ty,
                init,
                attributes,
            });
            ctx.replace_var(handle, replacement);
        }

        ctx.clone_program();
        Output::new(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use lumen_ast::dump_program;
    use lumen_reader::parse;

    use super::*;

    fn unshadow(source: &str) -> Program {
        let program = parse(source);
        program.ensure_valid().expect("source should parse");
        let out = Unshadow.run(&program, &DataMap::new()).program;
        assert!(out.is_valid(), "{}", out.diagnostics());
        out
    }

    #[test]
    fn locals_shadowing_globals_are_renamed() {
        let out = unshadow(
            "var<private> x: i32;\n\
             fn f() { let x = 1; let y = x; { var x = 2; x = y; } }\n\
             fn g() { x = 3; }",
        );
        let dump = dump_program(&out);
        assert!(dump.contains("let x_1 = 1i;"), "{dump}");
        assert!(dump.contains("let y = x_1;"), "{dump}");
        assert!(dump.contains("var x_2 = 2i;"), "{dump}");
        assert!(dump.contains("x_2 = y;"), "{dump}");
        // The module-scope variable keeps its name.
        assert!(dump.contains("var<private> x: i32;"), "{dump}");
        assert!(dump.contains("  x = 3i;"), "{dump}");
        assert_eq!(out.transforms_applied(), ["Unshadow"]);
    }

    #[test]
    fn parameters_shadowing_functions_are_renamed() {
        let out = unshadow("fn helper() {}\nfn f(helper: u32) -> u32 { return helper; }");
        let dump = dump_program(&out);
        assert!(dump.contains("fn f(helper_1: u32) -> u32 {"), "{dump}");
        assert!(dump.contains("return helper_1;"), "{dump}");
    }

    #[test]
    fn unrelated_programs_are_copied() {
        let source = "fn f() { let a = 1; }";
        let program = parse(source);
        let out = unshadow(source);
        assert_eq!(dump_program(&out), dump_program(&program));
    }
}
