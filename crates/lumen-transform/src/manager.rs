//! Ordered execution of transforms.

use lumen_ast::{Diagnostics, Program};

use crate::{Construct, DataMap, Transform};

/// Rejected registration: the new transform would reintroduce a construct
/// an earlier transform already eliminated.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(
        "transform '{transform}' introduces {construct}s, which '{finalized_by}' has already finalized"
    )]
    ConstructFinalized {
        transform: String,
        construct: Construct,
        finalized_by: String,
    },
}

/// Why a pipeline stopped before its last transform.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("input program is invalid:\n{diagnostics}")]
    InvalidInput { diagnostics: Diagnostics },
    #[error("transform '{name}' (#{index}) produced an invalid program:\n{}", .output.diagnostics())]
    TransformFailed {
        name: String,
        index: usize,
        /// The invalid program, kept for its diagnostics.
        output: Box<Program>,
    },
}

/// Result of [`Manager::run`].
#[derive(Debug)]
pub struct PipelineOutput {
    /// The last valid program: the final output on success, otherwise the
    /// input of the failing transform.
    pub program: Program,
    /// The inputs plus the outputs of every transform that succeeded. A
    /// failing transform's outputs are discarded.
    pub data: DataMap,
    pub failure: Option<PipelineError>,
}

impl PipelineOutput {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The final program, or the error that stopped the pipeline.
    pub fn into_result(self) -> Result<Program, PipelineError> {
        match self.failure {
            None => Ok(self.program),
            Some(err) => Err(err),
        }
    }
}

/// Runs transforms in registration order.
#[derive(Debug)]
pub struct Manager {
    transforms: Vec<Box<dyn Transform>>,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Appends a transform after checking it against those already
    /// registered.
    pub fn add(&mut self, transform: Box<dyn Transform>) -> Result<(), OrderError> {
        for &construct in transform.introduces() {
            if let Some(earlier) = self
                .transforms
                .iter()
                .find(|t| t.finalizes().contains(&construct))
            {
                return Err(OrderError::ConstructFinalized {
                    transform: transform.name().to_owned(),
                    construct,
                    finalized_by: earlier.name().to_owned(),
                });
            }
        }
        self.transforms.push(transform);
        Ok(())
    }

    /// Names of the registered transforms, in order.
    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Runs every transform on the output of the previous one, sharing
    /// `data` between them. Stops at the first transform whose output is
    /// invalid; nothing that transform produced is kept.
    pub fn run(&self, program: Program, mut data: DataMap) -> PipelineOutput {
        if !program.is_valid() {
            let diagnostics = program.diagnostics().clone();
            return PipelineOutput {
                program,
                data,
                failure: Some(PipelineError::InvalidInput { diagnostics }),
            };
        }

        let mut program = program;
        for (index, transform) in self.transforms.iter().enumerate() {
            log::debug!("running transform '{}'", transform.name());
            let output = transform.run(&program, &data);
            if !output.program.is_valid() {
                log::warn!(
                    "transform '{}' failed with {} error(s)",
                    transform.name(),
                    output.program.diagnostics().error_count()
                );
                return PipelineOutput {
                    program,
                    data,
                    failure: Some(PipelineError::TransformFailed {
                        name: transform.name().to_owned(),
                        index,
                        output: Box::new(output.program),
                    }),
                };
            }
            data.merge(output.data);
            program = output.program;
        }

        PipelineOutput {
            program,
            data,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use lumen_ast::{CloneContext, ProgramBuilder, System};

    use super::*;
    use crate::Output;

    #[derive(Debug)]
    struct Counting {
        runs: Rc<Cell<usize>>,
        fail: bool,
    }

    impl Transform for Counting {
        fn name(&self) -> &str {
            if self.fail { "Failing" } else { "Counting" }
        }

        fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
            self.runs.set(self.runs.get() + 1);
            let mut builder = ProgramBuilder::new();
            builder.mark_transform_applied(self.name());
            if self.fail {
                builder
                    .diagnostics_mut()
                    .add_error_unlocated(System::Transform, "failed on purpose");
            }
            CloneContext::new(program, &mut builder).clone_program();
            Output::new(builder.build())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Published(u32);

    /// Publishes a [`Published`] value, then fails when `fail` is set.
    #[derive(Debug)]
    struct Publishing {
        value: u32,
        fail: bool,
    }

    impl Transform for Publishing {
        fn name(&self) -> &str {
            "Publishing"
        }

        fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
            let mut builder = ProgramBuilder::new();
            if self.fail {
                builder
                    .diagnostics_mut()
                    .add_error_unlocated(System::Transform, "failed on purpose");
            }
            CloneContext::new(program, &mut builder).clone_program();
            let mut output = Output::new(builder.build());
            output.data.add(Published(self.value));
            output
        }
    }

    #[derive(Debug)]
    struct Tagged {
        name: &'static str,
        introduces: &'static [Construct],
        finalizes: &'static [Construct],
    }

    impl Transform for Tagged {
        fn name(&self) -> &str {
            self.name
        }

        fn introduces(&self) -> &[Construct] {
            self.introduces
        }

        fn finalizes(&self) -> &[Construct] {
            self.finalizes
        }

        fn run(&self, program: &Program, _inputs: &DataMap) -> Output {
            Output::new(program.clone())
        }
    }

    fn counting(runs: &Rc<Cell<usize>>, fail: bool) -> Box<dyn Transform> {
        Box::new(Counting {
            runs: Rc::clone(runs),
            fail,
        })
    }

    #[test]
    fn empty_manager_returns_input() {
        let manager = Manager::new();
        assert!(manager.is_empty());
        let out = manager.run(ProgramBuilder::new().build(), DataMap::new());
        assert!(out.is_success());
        assert!(out.program.transforms_applied().is_empty());
    }

    #[test]
    fn transforms_run_in_order() {
        let runs = Rc::new(Cell::new(0));
        let mut manager = Manager::new();
        manager.add(counting(&runs, false)).expect("no constraints");
        manager.add(counting(&runs, false)).expect("no constraints");
        assert_eq!(manager.names(), vec!["Counting", "Counting"]);

        let out = manager.run(ProgramBuilder::new().build(), DataMap::new());
        assert!(out.is_success());
        assert_eq!(runs.get(), 2);
        assert_eq!(out.program.transforms_applied(), ["Counting", "Counting"]);
    }

    #[test]
    fn first_failure_halts() {
        let runs = Rc::new(Cell::new(0));
        let mut manager = Manager::new();
        manager.add(counting(&runs, false)).expect("no constraints");
        manager.add(counting(&runs, true)).expect("no constraints");
        manager.add(counting(&runs, false)).expect("no constraints");

        let out = manager.run(ProgramBuilder::new().build(), DataMap::new());
        assert_eq!(runs.get(), 2);
        // The last valid program is the first transform's output.
        assert!(out.program.is_valid());
        assert_eq!(out.program.transforms_applied(), ["Counting"]);
        match out.failure {
            Some(PipelineError::TransformFailed {
                ref name,
                index,
                ref output,
            }) => {
                assert_eq!(name, "Failing");
                assert_eq!(index, 1);
                assert_eq!(output.diagnostics().to_string(), "failed on purpose");
            }
            other => panic!("expected TransformFailed, got {other:?}"),
        }
    }

    #[test]
    fn failed_transform_data_is_discarded() {
        let mut manager = Manager::new();
        manager
            .add(Box::new(Publishing { value: 1, fail: false }))
            .expect("no constraints");
        manager
            .add(Box::new(Publishing { value: 7, fail: true }))
            .expect("no constraints");

        let out = manager.run(ProgramBuilder::new().build(), DataMap::new());
        assert!(!out.is_success());
        assert_eq!(out.data.get::<Published>(), Some(&Published(1)));
    }

    #[test]
    fn invalid_input_is_rejected() {
        let runs = Rc::new(Cell::new(0));
        let mut manager = Manager::new();
        manager.add(counting(&runs, false)).expect("no constraints");

        let mut builder = ProgramBuilder::new();
        builder
            .diagnostics_mut()
            .add_error_unlocated(System::Parser, "broken");
        let out = manager.run(builder.build(), DataMap::new());
        assert_eq!(runs.get(), 0);
        let Some(PipelineError::InvalidInput { diagnostics }) = out.failure else {
            panic!("expected InvalidInput");
        };
        assert_eq!(diagnostics.to_string(), "broken");
    }

    #[test]
    fn reintroducing_a_finalized_construct_is_rejected() {
        let mut manager = Manager::new();
        manager
            .add(Box::new(Tagged {
                name: "Canonicalize",
                introduces: &[],
                finalizes: &[Construct::EntryPointParameter],
            }))
            .expect("first transform");
        let err = manager
            .add(Box::new(Tagged {
                name: "Inject",
                introduces: &[Construct::EntryPointParameter],
                finalizes: &[],
            }))
            .expect_err("order violation");
        assert_eq!(
            err.to_string(),
            "transform 'Inject' introduces entry point parameters, which 'Canonicalize' has already finalized"
        );
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn introducing_before_finalizing_is_accepted() {
        let mut manager = Manager::new();
        manager
            .add(Box::new(Tagged {
                name: "Inject",
                introduces: &[Construct::EntryPointParameter],
                finalizes: &[],
            }))
            .expect("first transform");
        manager
            .add(Box::new(Tagged {
                name: "Canonicalize",
                introduces: &[],
                finalizes: &[Construct::EntryPointParameter],
            }))
            .expect("valid order");
        assert_eq!(manager.len(), 2);
    }
}
