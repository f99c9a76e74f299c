//! Transcode step - produces the MKV artifact via ffmpeg.
//!
//! Builds the transcode job from the probed asset and the batch config,
//! then delegates to `VideoTranscoder`. Encoder failure here is fatal
//! for the asset (the transcoder has already exhausted its hardware to
//! software fallback).

use crate::models::TranscodeJob;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::PipelineStep;
use crate::orchestrator::types::{AssetState, Context, StepOutcome, TranscodeOutput};
use crate::runner::CommandRunner;
use crate::transcode::VideoTranscoder;

/// Transcode step that writes an H.264+AAC MKV under the temp root.
pub struct TranscodeStep {
    transcoder: VideoTranscoder,
}

impl TranscodeStep {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            transcoder: VideoTranscoder::new(runner),
        }
    }
}

impl PipelineStep for TranscodeStep {
    fn name(&self) -> &str {
        "Transcode"
    }

    fn validate_input(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        if !state.has_probe() {
            return Err(StepError::invalid_input(
                "Transcode requires probe results",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome> {
        let asset = state.probed_asset(&ctx.asset);
        let job = TranscodeJob::new(
            asset,
            &ctx.config.bitrate,
            ctx.config.encode_mode,
            ctx.mkv_path.clone(),
        );

        ctx.logger.info(&format!(
            "Encoding to {} (bitrate {}, {})",
            ctx.mkv_path.display(),
            job.bitrate,
            job.mode
        ));

        let artifact = self.transcoder.transcode(&job)?;
        ctx.logger
            .info(&format!("Encoded with {}", artifact.encoder));

        state.transcode = Some(TranscodeOutput {
            mkv_path: artifact.path,
            encoder: artifact.encoder,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        let output = state
            .transcode
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Transcode produced no output"))?;
        if !output.mkv_path.is_file() {
            return Err(StepError::invalid_output(format!(
                "Encoded file missing: {}",
                output.mkv_path.display()
            )));
        }
        Ok(())
    }
}
