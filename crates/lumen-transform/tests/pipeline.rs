//! End-to-end pipeline tests on the demo shaders.

use lumen_ast::{Access, dump_program};
use lumen_reader::parse_named;
use lumen_transform::{
    BindingPoint, BindingRemapperRemappings, CanonicalizeEntryPointIO, CanonicalizedEntryPoints,
    DataMap, Glsl, GlslConfig, Manager, OrderError, PipelineError, RemovePhonies,
    SingleEntryPoint, SingleEntryPointConfig, Unshadow, ZeroInitWorkgroupMemory,
};

const SCALE: &str = include_str!("../../../demos/scale.wgsl");
const TRIANGLE: &str = include_str!("../../../demos/triangle.wgsl");

fn glsl_manager() -> Manager {
    let mut manager = Manager::new();
    manager.add(Box::new(Glsl)).expect("single transform");
    manager
}

#[test]
fn glsl_pipeline_on_compute_shader() {
    let program = parse_named("scale.wgsl", SCALE);
    program.ensure_valid().expect("scale.wgsl should parse");

    let out = glsl_manager().run(program, DataMap::new());
    assert!(out.is_success(), "{:?}", out.failure);
    let program = out.program;
    assert!(program.is_valid(), "{}", program.diagnostics());
    assert_eq!(program.source_name(), Some("scale.wgsl"));
    assert_eq!(
        program.transforms_applied(),
        [
            "Unshadow",
            "ZeroInitWorkgroupMemory",
            "CanonicalizeEntryPointIO",
            "RemovePhonies",
            "BindingRemapper",
            "AddEmptyEntryPoint",
            "Glsl",
        ]
    );

    let dump = dump_program(&program);
    assert!(
        dump.contains(
            "struct main_inputs {\n  \
             @builtin(global_invocation_id) gid: vec3<u32>,\n  \
             @builtin(local_invocation_index) lid: u32,\n};"
        ),
        "{dump}"
    );
    let main = "\
@compute @workgroup_size(64, 1, 1)
fn main(inputs: main_inputs) {
  if ((inputs.lid == 0u)) {
    tile = array<f32, 64>();
  }
  workgroupBarrier();
  let i = inputs.gid.x;
  if ((i >= params.count)) {
    return;
  }
  tile[inputs.lid] = data[i];
  workgroupBarrier();
  data[i] = scaled(tile[inputs.lid]);
}
";
    assert!(dump.ends_with(main), "{dump}");

    let entry_points = out
        .data
        .get::<CanonicalizedEntryPoints>()
        .expect("published by CanonicalizeEntryPointIO");
    assert_eq!(
        entry_points.inputs.get("main").map(String::as_str),
        Some("main_inputs")
    );
}

#[test]
fn glsl_pipeline_selects_entry_point() {
    let program = parse_named("triangle.wgsl", TRIANGLE);
    let mut inputs = DataMap::new();
    inputs.add(GlslConfig {
        entry_point: Some("fs_main".to_owned()),
        disable_workgroup_init: false,
    });
    let mut remappings = BindingRemapperRemappings::default();
    remappings
        .binding_points
        .insert(BindingPoint::new(0, 0), BindingPoint::new(1, 3));
    inputs.add(remappings);

    let out = glsl_manager().run(program, inputs);
    assert!(out.is_success(), "{:?}", out.failure);
    let program = out.program;
    assert_eq!(program.entry_points().len(), 1);
    assert!(program.find_function("vs_main").is_none());

    let dump = dump_program(&program);
    assert!(dump.contains("@group(1) @binding(3) var<uniform> tint: vec4<f32>;"), "{dump}");
    let fs_main = "\
@fragment
fn fs_main(inputs: fs_main_inputs) -> @location(0) vec4<f32> {
  let brightness = 1.0f;
  return (inputs.color * tint);
}
";
    assert!(dump.ends_with(fs_main), "{dump}");
}

#[test]
fn disabling_workgroup_init() {
    let program = parse_named("scale.wgsl", SCALE);
    let mut inputs = DataMap::new();
    inputs.add(GlslConfig {
        entry_point: None,
        disable_workgroup_init: true,
    });
    let out = glsl_manager().run(program, inputs);
    let program = out.into_result().expect("pipeline succeeds");
    assert!(!program.has_transform_applied("ZeroInitWorkgroupMemory"));
    assert!(!dump_program(&program).contains("array<f32, 64>()"));
}

#[test]
fn pipeline_is_deterministic() {
    let run = || {
        let program = parse_named("triangle.wgsl", TRIANGLE);
        let mut inputs = DataMap::new();
        let mut remappings = BindingRemapperRemappings::default();
        remappings
            .access_controls
            .insert(BindingPoint::new(0, 0), Access::Read);
        inputs.add(remappings);
        let out = glsl_manager().run(program, inputs);
        let diagnostics = match &out.failure {
            Some(PipelineError::TransformFailed { output, .. }) => output.diagnostics().to_string(),
            other => panic!("expected TransformFailed, got {other:?}"),
        };
        (diagnostics, dump_program(&out.program))
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(
        first.0,
        "8:1: cannot apply access control to 'tint': variable is in the 'uniform' address space"
    );
}

#[test]
fn failing_transform_halts_pipeline() {
    let mut manager = Manager::new();
    manager.add(Box::new(Unshadow)).expect("valid order");
    manager.add(Box::new(SingleEntryPoint)).expect("valid order");
    manager.add(Box::new(RemovePhonies)).expect("valid order");

    let mut inputs = DataMap::new();
    inputs.add(SingleEntryPointConfig::new("missing"));
    let out = manager.run(parse_named("scale.wgsl", SCALE), inputs);

    // The last valid program is Unshadow's output; RemovePhonies never ran.
    assert!(out.program.is_valid());
    assert_eq!(out.program.transforms_applied(), ["Unshadow"]);
    match out.failure {
        Some(PipelineError::TransformFailed {
            ref name,
            index,
            ref output,
        }) => {
            assert_eq!(name, "SingleEntryPoint");
            assert_eq!(index, 1);
            assert!(!output.is_valid());
            assert_eq!(output.diagnostics().to_string(), "entry point 'missing' not found");
        }
        other => panic!("expected TransformFailed, got {other:?}"),
    }
}

#[test]
fn invalid_source_never_reaches_transforms() {
    let program = parse_named("broken.wgsl", "fn f( {}");
    let out = glsl_manager().run(program, DataMap::new());
    let Some(PipelineError::InvalidInput { diagnostics }) = out.failure else {
        panic!("expected InvalidInput");
    };
    assert!(diagnostics.contains_errors());
    assert!(out.program.transforms_applied().is_empty());
}

#[test]
fn order_is_validated_at_construction() {
    let mut manager = Manager::new();
    manager
        .add(Box::new(CanonicalizeEntryPointIO))
        .expect("valid order");
    let err = manager
        .add(Box::new(ZeroInitWorkgroupMemory))
        .expect_err("parameters would be introduced after canonicalization");
    let OrderError::ConstructFinalized {
        transform,
        finalized_by,
        ..
    } = err;
    assert_eq!(transform, "ZeroInitWorkgroupMemory");
    assert_eq!(finalized_by, "CanonicalizeEntryPointIO");
}
