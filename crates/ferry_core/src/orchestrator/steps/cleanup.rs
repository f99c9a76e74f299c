//! Cleanup step - removes local temp artifacts.
//!
//! Runs unconditionally at the end of the pipeline and removes the MKV,
//! the SRT, and any leftover native-format subtitle intermediate,
//! whether or not the uploads succeeded. Removal failures are warnings;
//! a file that was never produced is not an error.

use std::fs;
use std::path::Path;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::PipelineStep;
use crate::orchestrator::types::{AssetState, Context, StepOutcome};

/// Cleanup step that deletes per-asset temp files.
pub struct CleanupStep;

impl CleanupStep {
    pub fn new() -> Self {
        Self
    }

    fn remove_if_present(ctx: &Context, path: &Path) {
        if !path.exists() {
            return;
        }
        match fs::remove_file(path) {
            Ok(()) => ctx.logger.info(&format!("Removed {}", path.display())),
            Err(e) => ctx
                .logger
                .warn(&format!("Could not remove {}: {}", path.display(), e)),
        }
    }
}

impl Default for CleanupStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CleanupStep {
    fn name(&self) -> &str {
        "Cleanup"
    }

    fn validate_input(&self, _ctx: &Context, _state: &AssetState) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome> {
        Self::remove_if_present(ctx, &ctx.mkv_path);
        Self::remove_if_present(ctx, &ctx.srt_path);
        // Interrupted style-family extraction can strand the intermediate.
        Self::remove_if_present(ctx, &ctx.srt_path.with_extension("ass"));

        state.cleaned_up = true;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, _state: &AssetState) -> StepResult<()> {
        if ctx.mkv_path.exists() || ctx.srt_path.exists() {
            return Err(StepError::invalid_output("Temp artifacts survived cleanup"));
        }
        Ok(())
    }
}
