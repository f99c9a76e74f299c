//! Sequential runner for the per-asset stage sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult, StepError, StepResult};
use super::types::{AssetState, Context, StepOutcome};

/// One stage of the per-asset run.
///
/// Stages read the asset and config from `Context` and record what they
/// produced in `AssetState`. Input validation runs first so a missing
/// precondition is reported by the stage that needs it; output validation
/// runs only after a `Success` outcome, never after a skip.
pub trait PipelineStep: Send + Sync {
    /// Stage name, used in phase markers and error context.
    fn name(&self) -> &str;

    /// Check preconditions (source file present, earlier stage recorded
    /// its output).
    fn validate_input(&self, ctx: &Context, state: &AssetState) -> StepResult<()>;

    /// Do the stage's work, recording results in `state`. A stage that
    /// does not apply to this asset returns `Skipped`, not an error.
    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome>;

    /// Check that a successful execution left what it claims on disk and
    /// in `state`.
    fn validate_output(&self, ctx: &Context, state: &AssetState) -> StepResult<()>;
}

/// Runs the stages for one asset in order.
///
/// The first stage error aborts the remainder of the sequence; the batch
/// runner owns sweeping any temp artifacts that the aborted run left
/// behind. Cancellation is honored at stage boundaries only, so an
/// in-flight encode or upload always finishes or fails on its own terms.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Handle that stops the run at the next stage boundary.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Stage names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every stage against the given context and state.
    pub fn run(&self, ctx: &Context, state: &mut AssetState) -> PipelineResult<PipelineRunResult> {
        let asset_name = ctx.asset.display_name();
        let total = self.steps.len();
        let mut completed = Vec::new();
        let mut skipped = Vec::new();

        for (done, step) in self.steps.iter().enumerate() {
            if self.cancelled.load(Ordering::SeqCst) {
                ctx.logger
                    .warn(&format!("Cancelled before stage '{}'", step.name()));
                return Err(PipelineError::cancelled(asset_name));
            }

            let name = step.name();
            ctx.logger.phase(name);
            ctx.report_progress(name, (done * 100 / total) as u32, "starting");

            step.validate_input(ctx, state)
                .map_err(|e| fail(ctx, &asset_name, name, e))?;

            match step
                .execute(ctx, state)
                .map_err(|e| fail(ctx, &asset_name, name, e))?
            {
                StepOutcome::Success => {
                    step.validate_output(ctx, state)
                        .map_err(|e| fail(ctx, &asset_name, name, e))?;
                    ctx.logger.success(&format!("{} completed", name));
                    completed.push(name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", name, reason));
                    skipped.push(name.to_string());
                }
            }
        }

        ctx.report_progress("Done", 100, "asset finished");
        Ok(PipelineRunResult {
            steps_completed: completed,
            steps_skipped: skipped,
        })
    }
}

/// Log a stage failure to the asset log and wrap it with asset context.
fn fail(ctx: &Context, asset: &str, stage: &str, e: StepError) -> PipelineError {
    ctx.logger.error(&format!("{} failed: {}", stage, e));
    PipelineError::step_failed(asset, stage, e)
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for stopping a pipeline (or a batch) between stages.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Standalone handle, for cancelling a batch between assets.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Which stages ran and which declared themselves not applicable.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}
