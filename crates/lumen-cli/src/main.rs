use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

use lumen_ast::{Access, Diagnostics, Program, dump_program};
use lumen_transform::{
    BindingPoint, BindingRemapperRemappings, DataMap, Glsl, GlslConfig, Manager, PipelineError,
};

/// lumen: WGSL front end and transform pipeline
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input WGSL file
    input: PathBuf,

    /// Output path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Transform pipeline to run
    #[arg(long, value_enum, default_value_t = Pipeline::Glsl)]
    pipeline: Pipeline,

    /// Keep only this entry point
    #[arg(long)]
    entry_point: Option<String>,

    /// Do not zero-initialize workgroup memory
    #[arg(long)]
    disable_workgroup_init: bool,

    /// Move a resource binding, e.g. `0:1=2:0` (repeatable)
    #[arg(long, value_name = "G:B=G:B", value_parser = parse_binding_remap)]
    remap_binding: Vec<(BindingPoint, BindingPoint)>,

    /// Override the access mode of a storage buffer, e.g. `0:0=read`
    /// (repeatable)
    #[arg(long, value_name = "G:B=ACCESS", value_parser = parse_access_remap)]
    remap_access: Vec<(BindingPoint, Access)>,

    /// Allow remapped resources to share a binding point
    #[arg(long)]
    allow_collisions: bool,

    /// Dump the parsed program to stderr before transforming it
    #[arg(long)]
    emit_ast: bool,

    /// Parse and transform without producing output
    #[arg(long)]
    dry_run: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Pipeline {
    /// The GLSL backend preparation pipeline
    Glsl,
    /// No transforms
    None,
}

fn parse_binding_remap(s: &str) -> Result<(BindingPoint, BindingPoint), String> {
    let (from, to) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'G:B=G:B', found '{s}'"))?;
    let from = from.parse().map_err(|e| format!("{e}"))?;
    let to = to.parse().map_err(|e| format!("{e}"))?;
    Ok((from, to))
}

fn parse_access_remap(s: &str) -> Result<(BindingPoint, Access), String> {
    let (point, access) = s
        .split_once('=')
        .ok_or_else(|| format!("expected 'G:B=ACCESS', found '{s}'"))?;
    let point = point.parse().map_err(|e| format!("{e}"))?;
    let access = Access::parse(access).ok_or_else(|| {
        format!("invalid access mode '{access}', expected read, write, or read_write")
    })?;
    Ok((point, access))
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints `<file>:<line>:<col>: <severity>: <message>` per diagnostic.
fn report(file: &str, diagnostics: &Diagnostics) {
    for diag in diagnostics.iter() {
        match diag.location {
            Some(loc) => eprintln!(
                "{file}:{}:{}: {}: {}",
                loc.line, loc.column, diag.severity, diag.message
            ),
            None => eprintln!("{file}: {}: {}", diag.severity, diag.message),
        }
    }
}

fn pipeline_inputs(cli: &Cli) -> DataMap {
    let mut inputs = DataMap::new();
    inputs.add(GlslConfig {
        entry_point: cli.entry_point.clone(),
        disable_workgroup_init: cli.disable_workgroup_init,
    });
    if !cli.remap_binding.is_empty() || !cli.remap_access.is_empty() {
        inputs.add(BindingRemapperRemappings {
            binding_points: cli.remap_binding.iter().copied().collect(),
            access_controls: cli.remap_access.iter().copied().collect(),
            allow_collisions: cli.allow_collisions,
        });
    }
    inputs
}

fn transform(cli: &Cli, file: &str, program: Program) -> miette::Result<Program> {
    let mut manager = Manager::new();
    match cli.pipeline {
        Pipeline::Glsl => manager
            .add(Box::new(Glsl))
            .into_diagnostic()
            .wrap_err("invalid pipeline")?,
        Pipeline::None => {}
    }

    let output = manager.run(program, pipeline_inputs(cli));
    match output.failure {
        None => Ok(output.program),
        Some(PipelineError::TransformFailed { name, output, .. }) => {
            report(file, output.diagnostics());
            Err(miette::miette!("transform '{name}' failed"))
        }
        Some(err @ PipelineError::InvalidInput { .. }) => Err(err).into_diagnostic(),
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 1. Read and parse.
    let program = lumen_reader::parse_file(&cli.input)
        .into_diagnostic()
        .wrap_err("failed to load shader")?;
    let file = cli.input.display().to_string();

    // 2. Report parse and resolution diagnostics.
    report(&file, program.diagnostics());
    if !program.is_valid() {
        return Err(miette::miette!(
            "{} error(s) in {file}",
            program.diagnostics().error_count()
        ));
    }

    // 3. Optionally dump the parsed program to stderr.
    if cli.emit_ast {
        eprintln!("{}", dump_program(&program));
    }

    // 4. Transform.
    let program = transform(&cli, &file, program)?;
    log::debug!("applied: {}", program.transforms_applied().join(", "));

    // 5. Dry-run: stop here.
    if cli.dry_run {
        return Ok(());
    }

    // 6. Write output.
    let text = dump_program(&program);
    match &cli.output {
        Some(path) => std::fs::write(path, text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}
