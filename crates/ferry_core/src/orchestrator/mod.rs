//! Pipeline orchestrator for coordinating asset processing.
//!
//! This module provides the infrastructure for running the per-asset
//! processing pipeline. Each asset goes through a sequence of steps
//! that validate, execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Probe
//!     ├── Step: Transcode
//!     ├── Step: Subtitles
//!     ├── Step: Transfer
//!     └── Step: Cleanup
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ferry_core::orchestrator::BatchRunner;
//!
//! let runner = BatchRunner::new(config);
//! let summary = runner.run(|_| None, None)?;
//! println!("{} succeeded, {} failed",
//!     summary.succeeded_count(), summary.failed_count());
//! ```

mod batch;
mod errors;
mod pipeline;
pub mod steps;
mod types;

pub use batch::{BatchError, BatchResult, BatchRunner};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult, PipelineStep};
pub use steps::{CleanupStep, ProbeStep, SubtitlesStep, TranscodeStep, TransferStep};
pub use types::{
    AssetState, Context, ProbeOutput, ProgressCallback, StepOutcome, SubtitleOutput,
    TranscodeOutput,
};

use crate::config::BatchConfig;
use crate::runner::CommandRunner;

/// Create the standard per-asset pipeline with all steps in order.
///
/// 1. Probe - detect bit depth and subtitle codec via ffprobe
/// 2. Transcode - encode to H.264+AAC MKV (GPU with CPU fallback)
/// 3. Subtitles - best-effort SRT extraction
/// 4. Transfer - upload artifacts (SFTP with SCP fallback)
/// 5. Cleanup - remove local temp artifacts
pub fn create_standard_pipeline(config: &BatchConfig) -> Pipeline {
    let runner = CommandRunner::new(config.tool_timeout());
    Pipeline::new()
        .with_step(ProbeStep::new(runner.clone()))
        .with_step(TranscodeStep::new(runner.clone()))
        .with_step(SubtitlesStep::new(runner.clone()))
        .with_step(TransferStep::new(runner))
        .with_step(CleanupStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn standard_pipeline_has_expected_steps() {
        let config = BatchConfig {
            source_root: PathBuf::from("/videos"),
            dest_host: "host".to_string(),
            dest_folder: "/srv/media".to_string(),
            bitrate: "2M".to_string(),
            encode_mode: Default::default(),
            username: "u".to_string(),
            password: None,
            transfer_method: Default::default(),
            temp_root: PathBuf::from("/tmp/transcode"),
            logs_folder: PathBuf::from(".logs"),
            tool_timeout_secs: 60,
        };

        let pipeline = create_standard_pipeline(&config);
        assert_eq!(
            pipeline.step_names(),
            vec!["Probe", "Transcode", "Subtitles", "Transfer", "Cleanup"]
        );
    }
}
