//! Integration tests for the lumen reader.

use lumen_ast::{
    Access, ImageFormat, PipelineStage, SamplerKind, Scalar, TextureDimension, TextureKind, Type,
    dump_program,
};
use lumen_reader::{parse, parse_named, parse_type};

fn type_error(source: &str) -> String {
    let (ty, builder) = parse_type(source);
    assert!(ty.is_none(), "'{source}' should not parse");
    builder.diagnostics().to_string()
}

fn program_errors(source: &str) -> String {
    let program = parse(source);
    assert!(!program.is_valid(), "'{source}' should be rejected");
    program.diagnostics().to_string()
}

#[test]
fn parse_scale() {
    let source = include_str!("../../../demos/scale.wgsl");
    let program = parse(source);
    program.ensure_valid().expect("scale.wgsl should parse");
    let dump = dump_program(&program);

    let entry_points = program.entry_points();
    assert_eq!(entry_points.len(), 1);
    let main = entry_points[0];
    assert_eq!(program.name_of(program[main].name), "main");
    assert_eq!(program.ast().stage_of(main), Some(PipelineStage::Compute));

    let info = program.sem().function(main).expect("main is resolved");
    assert_eq!(info.workgroup_size, Some([64, 1, 1]));
    let globals: Vec<&str> = info
        .referenced_globals
        .iter()
        .map(|&v| program.name_of(program[v].name))
        .collect();
    assert_eq!(globals, vec!["data", "params", "tile"]);

    assert!(dump.contains("@compute @workgroup_size(64, 1, 1)"));
    assert!(dump.contains("@group(0) @binding(0) var<storage, read_write> data: array<f32>;"));
    assert!(dump.contains("var<workgroup> tile: array<f32, 64>;"));
    assert!(dump.contains("struct Params {\n  factor: f32,\n  count: u32,\n};"));
}

#[test]
fn parse_triangle() {
    let source = include_str!("../../../demos/triangle.wgsl");
    let program = parse_named("triangle.wgsl", source);
    program.ensure_valid().expect("triangle.wgsl should parse");
    assert_eq!(program.source_name(), Some("triangle.wgsl"));

    let stages: Vec<_> = program
        .entry_points()
        .into_iter()
        .map(|f| program.ast().stage_of(f))
        .collect();
    assert_eq!(
        stages,
        vec![Some(PipelineStage::Vertex), Some(PipelineStage::Fragment)]
    );

    let dump = dump_program(&program);
    assert!(dump.contains("fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {"));
    assert!(dump.contains("  _ = brightness;"));
    assert!(dump.contains("  out.position = vec4<f32>(x, y, 0.0f, 1.0f);"));
}

#[test]
fn sampled_texture_types() {
    let (ty, builder) = parse_type("texture_2d_array<i32>");
    let ty = ty.expect("texture type");
    let Type::Texture(texture) = builder.types()[ty] else {
        panic!("expected Texture");
    };
    assert_eq!(texture.dim, TextureDimension::D2Array);
    let TextureKind::Sampled(elem) = texture.kind else {
        panic!("expected sampled texture");
    };
    assert_eq!(builder.types()[elem], Type::Scalar(Scalar::I32));
}

#[test]
fn sampled_texture_errors() {
    assert_eq!(type_error("texture_1d<abc>"), "1:12: unknown constructed type 'abc'");
    assert_eq!(type_error("texture_1d<>"), "1:12: invalid type for sampled texture type");
    assert_eq!(type_error("texture_1d"), "1:11: expected '<' for sampled texture type");
    assert_eq!(type_error("texture_1d<u32"), "1:15: expected '>' for sampled texture type");
    assert_eq!(type_error("texture_1d<bool>"), "1:12: invalid type for sampled texture type");
}

#[test]
fn multisampled_texture_errors() {
    assert_eq!(
        type_error("texture_multisampled_2d<abc>"),
        "1:25: unknown constructed type 'abc'"
    );
    assert_eq!(
        type_error("texture_multisampled_2d<>"),
        "1:25: invalid type for multisampled texture type"
    );
    assert_eq!(
        type_error("texture_multisampled_2d"),
        "1:24: expected '<' for multisampled texture type"
    );
    assert_eq!(
        type_error("texture_multisampled_2d<u32"),
        "1:28: expected '>' for multisampled texture type"
    );
}

#[test]
fn storage_texture_types() {
    let (ty, builder) = parse_type("texture_storage_2d<rgba8unorm, read>");
    let Type::Texture(texture) = builder.types()[ty.expect("texture type")] else {
        panic!("expected Texture");
    };
    assert_eq!(
        texture.kind,
        TextureKind::Storage {
            format: ImageFormat::Rgba8Unorm,
            access: Access::Read,
        }
    );

    // Access defaults to write.
    let (ty, builder) = parse_type("texture_storage_3d<r32float>");
    let Type::Texture(texture) = builder.types()[ty.expect("texture type")] else {
        panic!("expected Texture");
    };
    assert_eq!(texture.dim, TextureDimension::D3);
    assert_eq!(
        texture.kind,
        TextureKind::Storage {
            format: ImageFormat::R32Float,
            access: Access::Write,
        }
    );
}

#[test]
fn storage_texture_errors() {
    assert_eq!(
        type_error("texture_storage_1d<abc>"),
        "1:20: invalid format for storage texture type"
    );
    assert_eq!(
        type_error("texture_storage_1d<>"),
        "1:20: invalid format for storage texture type"
    );
    assert_eq!(
        type_error("texture_storage_1d"),
        "1:19: expected '<' for storage texture type"
    );
    assert_eq!(
        type_error("texture_storage_1d<r8unorm"),
        "1:27: expected '>' for storage texture type"
    );
    assert_eq!(
        type_error("texture_storage_1d<r8unorm, maybe>"),
        "1:29: invalid access control for storage texture type"
    );
}

#[test]
fn depth_textures_and_samplers() {
    let (ty, builder) = parse_type("texture_depth_cube");
    let Type::Texture(texture) = builder.types()[ty.expect("texture type")] else {
        panic!("expected Texture");
    };
    assert_eq!(texture.dim, TextureDimension::Cube);
    assert_eq!(texture.kind, TextureKind::Depth);

    let (ty, builder) = parse_type("sampler_comparison");
    assert_eq!(
        builder.types()[ty.expect("sampler type")],
        Type::Sampler(SamplerKind::Comparison)
    );
}

#[test]
fn type_alias_errors() {
    assert_eq!(program_errors("type 123 = i32;"), "1:6: expected identifier for type alias");
    assert_eq!(program_errors("type a i32"), "1:8: expected '=' for type alias");
    assert_eq!(program_errors("type a = B;"), "1:10: unknown constructed type 'B'");
    assert_eq!(program_errors("type a = ;"), "1:10: missing type for type alias");
}

#[test]
fn resolution_errors_are_located() {
    assert_eq!(
        program_errors("fn f() { let x = 1; x = 2; }"),
        "1:21: cannot assign to let 'x'"
    );
    assert_eq!(
        program_errors("fn f() { let x = y; }"),
        "1:18: unknown identifier 'y'"
    );
    assert_eq!(
        program_errors("@compute fn main() {}"),
        "1:1: compute entry point 'main' must have a @workgroup_size attribute"
    );
}

#[test]
fn syntax_errors_skip_resolution() {
    // The unknown identifier is never reported: resolution does not run
    // once parsing has failed.
    let program = parse("fn f() { let x = y; }\nfn g() { let z = ; }");
    assert!(!program.is_valid());
    assert_eq!(program.diagnostics().to_string(), "2:18: unable to parse expression");
    let f = program.find_function("f").expect("f");
    assert!(program.sem().function(f).is_none());
}

#[test]
fn empty_source_is_valid() {
    let program = parse("// nothing here\n");
    assert!(program.is_valid());
    assert!(program.globals().is_empty());
    assert!(program.entry_points().is_empty());
}
