//! Subtitle extraction to SRT.
//!
//! Branches on the codec family detected at probe time:
//! - text: one-step ffmpeg conversion straight to SRT
//! - style (ASS/SSA): extract the native stream with `-c:s copy`, convert
//!   the intermediate to SRT, then delete the intermediate unconditionally
//! - image (DVD/PGS): best-effort attempt; these need OCR and usually fail
//!
//! Nothing here is ever fatal to the asset: every failure path logs a
//! warning and yields no artifact.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{SubtitleFamily, SubtitleJob};
use crate::runner::{CommandRunner, RunnerError};

/// Errors internal to extraction; callers only ever see `Option<SrtArtifact>`.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg failed with exit code {exit_code}: {message}")]
    CommandFailed { exit_code: i32, message: String },

    #[error("Extraction produced no file at {0}")]
    MissingOutput(String),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Result type for extraction internals.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// A produced SRT artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtArtifact {
    pub path: PathBuf,
}

/// Extracts the first subtitle stream of an asset to SRT.
#[derive(Debug, Clone)]
pub struct SubtitleExtractor {
    runner: CommandRunner,
}

impl SubtitleExtractor {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Extract subtitles for a job.
    ///
    /// Returns `None` when the asset has no detected subtitle stream
    /// (logged as skipped, not a warning) or when any extraction path
    /// fails (logged as a warning). Never aborts the asset.
    pub fn extract(&self, job: &SubtitleJob) -> Option<SrtArtifact> {
        let codec = match &job.asset.subtitle_codec {
            Some(codec) => codec.clone(),
            None => {
                tracing::info!(
                    "No subtitle stream in {}, skipping extraction",
                    job.asset.display_name()
                );
                return None;
            }
        };

        if let Some(parent) = job.output_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(
                    "Could not create subtitle output directory {}: {}",
                    parent.display(),
                    e
                );
                return None;
            }
        }

        let result = match codec.family {
            SubtitleFamily::Text => self.extract_text(job),
            SubtitleFamily::Style => self.extract_style(job),
            SubtitleFamily::Image => {
                tracing::warn!(
                    "Image-based subtitles ({}) in {}: OCR conversion required, attempting anyway",
                    codec.name,
                    job.asset.display_name()
                );
                self.extract_text(job)
            }
        };

        match result {
            Ok(artifact) => {
                tracing::info!("Extracted subtitles to {}", artifact.path.display());
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(
                    "Subtitle extraction failed for {} ({} family): {}",
                    job.asset.display_name(),
                    codec.family,
                    e
                );
                None
            }
        }
    }

    /// One-step extraction: map the first subtitle stream and let ffmpeg
    /// convert it to SRT directly.
    fn extract_text(&self, job: &SubtitleJob) -> ExtractionResult<SrtArtifact> {
        let input = job.asset.source_path.display().to_string();
        let output = job.output_path.display().to_string();

        self.run_ffmpeg(&[
            "-y", "-i", &input, "-map", "0:s:0", "-c:s", "srt", &output,
        ])?;

        self.verify_output(&job.output_path)
    }

    /// Two-step ASS/SSA path: copy the native stream out, then convert the
    /// intermediate file to SRT. The intermediate is deleted whether or
    /// not the conversion succeeded.
    fn extract_style(&self, job: &SubtitleJob) -> ExtractionResult<SrtArtifact> {
        let input = job.asset.source_path.display().to_string();
        let native = job.native_temp_path();
        let native_str = native.display().to_string();
        let output = job.output_path.display().to_string();

        let result = self
            .run_ffmpeg(&[
                "-y", "-i", &input, "-map", "0:s:0", "-c:s", "copy", &native_str,
            ])
            .and_then(|_| {
                self.run_ffmpeg(&["-y", "-i", &native_str, "-c:s", "srt", &output])
            });

        if native.exists() {
            if let Err(e) = fs::remove_file(&native) {
                tracing::warn!(
                    "Could not remove intermediate {}: {}",
                    native.display(),
                    e
                );
            }
        }

        result?;
        self.verify_output(&job.output_path)
    }

    fn run_ffmpeg(&self, args: &[&str]) -> ExtractionResult<()> {
        let output = self.runner.run("ffmpeg", args)?;
        if !output.success() {
            return Err(ExtractionError::CommandFailed {
                exit_code: output.exit_code,
                message: output.stderr_tail(),
            });
        }
        Ok(())
    }

    fn verify_output(&self, path: &Path) -> ExtractionResult<SrtArtifact> {
        if !path.exists() {
            return Err(ExtractionError::MissingOutput(path.display().to_string()));
        }
        Ok(SrtArtifact {
            path: path.to_path_buf(),
        })
    }
}
