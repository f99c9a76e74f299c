//! Subtitle step - extracts the first subtitle stream to SRT.
//!
//! Best-effort: when the asset has no subtitle stream the step is
//! skipped, and when extraction fails the asset continues with only its
//! MKV artifact. The extractor logs failures as warnings.

use crate::models::SubtitleJob;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::PipelineStep;
use crate::orchestrator::types::{AssetState, Context, StepOutcome, SubtitleOutput};
use crate::runner::CommandRunner;
use crate::subtitles::SubtitleExtractor;

/// Subtitle step that writes an SRT next to the MKV when possible.
pub struct SubtitlesStep {
    extractor: SubtitleExtractor,
}

impl SubtitlesStep {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            extractor: SubtitleExtractor::new(runner),
        }
    }
}

impl PipelineStep for SubtitlesStep {
    fn name(&self) -> &str {
        "Subtitles"
    }

    fn validate_input(&self, _ctx: &Context, _state: &AssetState) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome> {
        let asset = state.probed_asset(&ctx.asset);
        if !asset.has_subtitles() {
            state.subtitles = Some(SubtitleOutput { srt_path: None });
            return Ok(StepOutcome::Skipped(
                "No subtitle stream detected".to_string(),
            ));
        }

        let job = SubtitleJob::new(asset, ctx.srt_path.clone());
        let srt_path = match self.extractor.extract(&job) {
            Some(artifact) => {
                ctx.logger
                    .info(&format!("Subtitles written to {}", artifact.path.display()));
                Some(artifact.path)
            }
            None => {
                ctx.logger
                    .warn("Subtitle extraction failed, continuing without SRT");
                None
            }
        };

        state.subtitles = Some(SubtitleOutput { srt_path });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        // An SRT is optional; only its recorded path must be real.
        if let Some(path) = state.srt_artifact() {
            if !path.is_file() {
                return Err(StepError::invalid_output(format!(
                    "Recorded SRT missing: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}
