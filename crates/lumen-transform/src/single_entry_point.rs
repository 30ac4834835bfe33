//! Strips a program down to one entry point.

use std::collections::BTreeSet;

use lumen_ast::{
    CloneContext, Expression, GlobalDecl, Handle, Program, ProgramBuilder, System, Variable,
};

use crate::{DataMap, Output, Transform};

/// Input of [`SingleEntryPoint`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleEntryPointConfig {
    /// Name of the entry point to keep.
    pub entry_point: String,
}

impl SingleEntryPointConfig {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
        }
    }
}

/// Keeps the configured entry point and only the functions and module-scope
/// variables it uses. Type declarations are always kept.
#[derive(Debug, Default)]
pub struct SingleEntryPoint;

impl Transform for SingleEntryPoint {
    fn name(&self) -> &str {
        "SingleEntryPoint"
    }

    fn run(&self, program: &Program, inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());

        let Some(config) = inputs.get::<SingleEntryPointConfig>() else {
            builder
                .diagnostics_mut()
                .add_error_unlocated(System::Transform, "missing SingleEntryPointConfig input");
            CloneContext::new(program, &mut builder).clone_program();
            return Output::new(builder.build());
        };

        let entry = program
            .entry_points()
            .into_iter()
            .find(|&f| program.name_of(program[f].name) == config.entry_point);
        let Some(entry) = entry else {
            builder.diagnostics_mut().add_error_unlocated(
                System::Transform,
                format!("entry point '{}' not found", config.entry_point),
            );
            CloneContext::new(program, &mut builder).clone_program();
            return Output::new(builder.build());
        };

        let (callees, globals) = match program.sem().function(entry) {
            Some(info) => (info.callees.clone(), info.referenced_globals.clone()),
            None => Default::default(),
        };
        let globals = with_initializer_dependencies(program, globals);

        let mut ctx = CloneContext::new(program, &mut builder);
        let mut removed = 0usize;
        for &decl in program.globals() {
            match decl {
                GlobalDecl::Function(f) if f != entry && !callees.contains(&f) => {
                    ctx.remove_function(f);
                    removed += 1;
                }
                GlobalDecl::Variable(v) if !globals.contains(&v) => {
                    ctx.remove_var(v);
                    removed += 1;
                }
                _ => {}
            }
        }
        log::debug!(
            "kept entry point '{}', removed {removed} declaration(s)",
            config.entry_point
        );

        ctx.clone_program();
        Output::new(builder.build())
    }
}

/// Adds the module-scope variables that initializers of `globals` refer to.
fn with_initializer_dependencies(
    program: &Program,
    mut globals: BTreeSet<Handle<Variable>>,
) -> BTreeSet<Handle<Variable>> {
    let mut worklist: Vec<Handle<Variable>> = globals.iter().copied().collect();
    while let Some(var) = worklist.pop() {
        let Some(init) = program[var].init else {
            continue;
        };
        let mut exprs: Vec<Handle<Expression>> = vec![init];
        while let Some(expr) = exprs.pop() {
            if let Some(used) = program.sem().resolved_variable(expr)
                && program.sem().is_module_scope(used)
                && globals.insert(used)
            {
                worklist.push(used);
            }
            exprs.extend(program[expr].kind.operands());
        }
    }
    globals
}
