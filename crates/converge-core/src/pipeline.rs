//! Orchestration pipeline: ordered, fallible mutation steps.
//!
//! A lifecycle operation (create, update, delete) is expressed as an
//! ordered sequence of steps. Each step is fully constructed, including
//! any fallible request building, before the sequence runs; construction
//! failures therefore surface before any remote mutation is issued.
//! Execution is strictly sequential, a `None` slot is skipped, and the
//! first failing step's error is returned as-is. Nothing is compensated
//! or rolled back; callers needing eventual convergence wrap the whole
//! sequence in an external retry loop.

use crate::error::ConvergeResult;
use converge_types::ResourceState;
use tracing::{debug, warn};

/// Executor closure of one step.
pub type StepFn<'a> = Box<dyn FnOnce(&mut ResourceState) -> ConvergeResult<()> + 'a>;

/// Fallible step constructor; `Ok(None)` registers an absent step.
pub type StepBuilder<'a> = Box<dyn FnOnce() -> ConvergeResult<Option<Step<'a>>> + 'a>;

/// One named, fully built orchestration step.
pub struct Step<'a> {
    name: String,
    exec: StepFn<'a>,
}

impl<'a> Step<'a> {
    /// Creates a step from a name and an executor closure.
    ///
    /// Build the request payload *before* calling this, so that request
    /// construction errors fail the operation ahead of any remote call:
    ///
    /// ```ignore
    /// let request = map_to_wire(&mut state, &rules, MapMode::Create)?;
    /// let step = Step::new("create server", move |state| {
    ///     let payload = remote.invoke(&request)?;
    ///     merge_response(state, &payload, &overrides)
    /// });
    /// ```
    pub fn new<F>(name: impl Into<String>, exec: F) -> Self
    where
        F: FnOnce(&mut ResourceState) -> ConvergeResult<()> + 'a,
    {
        Self {
            name: name.into(),
            exec: Box::new(exec),
        }
    }

    /// Returns the step name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// An ordered sequence of possibly-absent steps.
#[derive(Debug, Default)]
pub struct Sequence<'a> {
    steps: Vec<Option<Step<'a>>>,
}

impl<'a> Sequence<'a> {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn step(mut self, step: Step<'a>) -> Self {
        self.steps.push(Some(step));
        self
    }

    /// Appends a possibly-absent step; `None` is skipped at run time.
    pub fn maybe_step(mut self, step: Option<Step<'a>>) -> Self {
        self.steps.push(step);
        self
    }

    /// Builds a sequence from fallible step constructors.
    ///
    /// Every constructor runs to completion before any step executes, so
    /// a request-building error in a late step fails the whole operation
    /// ahead of the first remote mutation.
    pub fn plan(builders: impl IntoIterator<Item = StepBuilder<'a>>) -> ConvergeResult<Self> {
        let mut sequence = Sequence::new();
        for build in builders {
            sequence = sequence.maybe_step(build()?);
        }
        Ok(sequence)
    }

    /// Returns the number of registered slots, absent ones included.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the steps in registration order.
    ///
    /// The first failing step's error is returned immediately; later
    /// steps never run. No parallelism, no rollback.
    pub fn run(self, state: &mut ResourceState) -> ConvergeResult<()> {
        for (index, slot) in self.steps.into_iter().enumerate() {
            let Some(step) = slot else {
                debug!(index, "skipping absent step");
                continue;
            };
            debug!(index, step = %step.name, "running step");
            if let Err(err) = (step.exec)(state) {
                warn!(index, step = %step.name, %err, "step failed, aborting sequence");
                return Err(err);
            }
        }
        Ok(())
    }
}
