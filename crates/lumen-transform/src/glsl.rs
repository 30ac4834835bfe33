//! The transform sequence a GLSL backend expects.

use lumen_ast::{CloneContext, Program, ProgramBuilder, System};

use crate::{
    AddEmptyEntryPoint, BindingRemapper, BindingRemapperRemappings, CanonicalizeEntryPointIO,
    Construct, DataMap, Manager, OrderError, Output, PipelineError, RemovePhonies, SingleEntryPoint,
    SingleEntryPointConfig, Transform, Unshadow, ZeroInitWorkgroupMemory,
};

/// Input of [`Glsl`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlslConfig {
    /// Keep only this entry point.
    pub entry_point: Option<String>,
    /// Skip zero-initialization of workgroup storage.
    pub disable_workgroup_init: bool,
}

/// Runs, in order: [`Unshadow`], [`ZeroInitWorkgroupMemory`] (unless
/// disabled), [`CanonicalizeEntryPointIO`], [`SingleEntryPoint`] (when an
/// entry point is named), [`RemovePhonies`], [`BindingRemapper`] and
/// [`AddEmptyEntryPoint`].
///
/// Reads a [`GlslConfig`] and an optional [`BindingRemapperRemappings`]
/// from its inputs.
#[derive(Debug, Default)]
pub struct Glsl;

impl Glsl {
    /// The inner pipeline for `config`.
    pub fn manager(config: &GlslConfig) -> Result<Manager, OrderError> {
        let mut manager = Manager::new();
        manager.add(Box::new(Unshadow))?;
        if !config.disable_workgroup_init {
            manager.add(Box::new(ZeroInitWorkgroupMemory))?;
        }
        manager.add(Box::new(CanonicalizeEntryPointIO))?;
        if config.entry_point.is_some() {
            manager.add(Box::new(SingleEntryPoint))?;
        }
        manager.add(Box::new(RemovePhonies))?;
        manager.add(Box::new(BindingRemapper))?;
        manager.add(Box::new(AddEmptyEntryPoint))?;
        Ok(manager)
    }
}

impl Transform for Glsl {
    fn name(&self) -> &str {
        "Glsl"
    }

    fn introduces(&self) -> &[Construct] {
        &[Construct::EntryPoint]
    }

    fn finalizes(&self) -> &[Construct] {
        &[
            Construct::ShadowedName,
            Construct::EntryPointParameter,
            Construct::PhonyAssignment,
        ]
    }

    fn run(&self, program: &Program, inputs: &DataMap) -> Output {
        let config = inputs.get::<GlslConfig>().cloned().unwrap_or_default();
        let manager = match Glsl::manager(&config) {
            Ok(manager) => manager,
            Err(err) => {
                let mut builder = ProgramBuilder::new();
                builder
                    .diagnostics_mut()
                    .add_error_unlocated(System::Transform, err.to_string());
                CloneContext::new(program, &mut builder).clone_program();
                return Output::new(builder.build());
            }
        };

        let mut data = DataMap::new();
        if let Some(entry_point) = &config.entry_point {
            data.add(SingleEntryPointConfig::new(entry_point.clone()));
        }
        if let Some(remappings) = inputs.get::<BindingRemapperRemappings>() {
            data.add(remappings.clone());
        }

        let result = manager.run(program.clone(), data);
        let inner = match result.failure {
            None => result.program,
            Some(PipelineError::TransformFailed { output, .. }) => {
                return Output {
                    program: *output,
                    data: result.data,
                };
            }
            Some(PipelineError::InvalidInput { .. }) => {
                return Output {
                    program: result.program,
                    data: result.data,
                };
            }
        };

        let mut builder = ProgramBuilder::new();
        builder.mark_transform_applied(self.name());
        CloneContext::new(&inner, &mut builder).clone_program();
        Output {
            program: builder.build(),
            data: result.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order() {
        let manager = Glsl::manager(&GlslConfig::default()).expect("valid order");
        assert_eq!(
            manager.names(),
            vec![
                "Unshadow",
                "ZeroInitWorkgroupMemory",
                "CanonicalizeEntryPointIO",
                "RemovePhonies",
                "BindingRemapper",
                "AddEmptyEntryPoint",
            ]
        );
    }

    #[test]
    fn configured_order() {
        let config = GlslConfig {
            entry_point: Some("main".to_owned()),
            disable_workgroup_init: true,
        };
        let manager = Glsl::manager(&config).expect("valid order");
        assert_eq!(
            manager.names(),
            vec![
                "Unshadow",
                "CanonicalizeEntryPointIO",
                "SingleEntryPoint",
                "RemovePhonies",
                "BindingRemapper",
                "AddEmptyEntryPoint",
            ]
        );
    }
}
