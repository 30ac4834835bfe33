//! Guarantees at least one entry point.

use lumen_ast::{
    AttributeKind, CloneContext, Function, GlobalDecl, PipelineStage, Program, ProgramBuilder,
    Span, StatementKind,
};

use crate::{Construct, DataMap, Output, Transform};

/// Appends `@compute @workgroup_size(1) fn unused_entry_point() {}` to a
/// program that has no entry point.
#[derive(Debug, Default)]
pub struct AddEmptyEntryPoint;

impl Transform for AddEmptyEntryPoint {
    fn name(&self) -> &str {
        "AddEmptyEntryPoint"
    }

    fn introduces(&self) -> &[Construct] {
        &[Construct::EntryPoint]
    }

    fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        let mut ctx = CloneContext::new(program, &mut builder);

        if program.entry_points().is_empty() {
            let name = ctx.unique_symbol("unused_entry_point");
            let dst = ctx.dst();
            let stage = dst.attr(Span::default(), AttributeKind::Stage(PipelineStage::Compute));
            let size = dst.attr(Span::default(), AttributeKind::WorkgroupSize([1, 1, 1]));
            let body = dst.stmt(Span::default(), StatementKind::Block(Vec::new()));
            let function = dst.function(Function {
                span: Span::default(),
                name,
                params: Vec::new(),
                return_type: None,
                return_attributes: Vec::new(),
                body,
                attributes: vec![stage, size],
            });
            ctx.insert_global_back(GlobalDecl::Function(function));
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

    #[test]
    fn adds_entry_point_when_missing() {
        let program = parse("fn helper() {}");
        let out = AddEmptyEntryPoint.run(&program, &DataMap::new()).program;
        assert!(out.is_valid(), "{}", out.diagnostics());
        assert_eq!(
            dump_program(&out),
            "fn helper() {\n}\n\n@compute @workgroup_size(1, 1, 1)\nfn unused_entry_point() {\n}\n"
        );
        assert_eq!(out.entry_points().len(), 1);
    }

    #[test]
    fn existing_entry_points_are_enough() {
        let program = parse("@fragment fn fs() {}");
        let out = AddEmptyEntryPoint.run(&program, &DataMap::new()).program;
        assert_eq!(out.entry_points().len(), 1);
        assert!(out.find_function("unused_entry_point").is_none());
    }
}
