//! Probe step - inspects the source with ffprobe.
//!
//! Detects the video bit depth (drives encoder pixel format selection)
//! and the first subtitle stream's codec (drives the extraction path).
//! Detection failures degrade: an unreadable pixel format probes as
//! unknown bit depth, a failed subtitle probe means no extraction.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::PipelineStep;
use crate::orchestrator::types::{AssetState, Context, ProbeOutput, StepOutcome};
use crate::probe::MediaProbe;
use crate::runner::CommandRunner;

/// Probe step that records bit depth and subtitle codec in state.
pub struct ProbeStep {
    probe: MediaProbe,
}

impl ProbeStep {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            probe: MediaProbe::new(runner),
        }
    }
}

impl PipelineStep for ProbeStep {
    fn name(&self) -> &str {
        "Probe"
    }

    fn validate_input(&self, ctx: &Context, _state: &AssetState) -> StepResult<()> {
        if !ctx.asset.source_path.is_file() {
            return Err(StepError::invalid_input(format!(
                "Source file not found: {}",
                ctx.asset.source_path.display()
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome> {
        let bit_depth = self.probe.detect_bit_depth(&ctx.asset.source_path);
        ctx.logger.info(&format!("Video bit depth: {}", bit_depth));

        let subtitle_codec = self.probe.detect_subtitle_codec(&ctx.asset.source_path);
        match &subtitle_codec {
            Some(codec) => ctx.logger.info(&format!(
                "Subtitle stream: {} ({} family)",
                codec.name, codec.family
            )),
            None => ctx.logger.info("No subtitle stream detected"),
        }

        state.probe = Some(ProbeOutput {
            bit_depth,
            subtitle_codec,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        if !state.has_probe() {
            return Err(StepError::invalid_output("Probe produced no output"));
        }
        Ok(())
    }
}
