//! Stream probing with ffprobe.
//!
//! Two questions are asked of every asset before transcoding: the primary
//! video stream's bit depth (drives the NVENC pixel-format downconversion)
//! and the codec of the first subtitle stream (drives the extraction
//! branch). Both probes are non-fatal: failures downgrade to
//! `BitDepth::Unknown` / no subtitle, with a warning.

use std::path::Path;

use thiserror::Error;

use crate::models::{BitDepth, SubtitleCodec};
use crate::runner::{CommandRunner, RunnerError};

/// Errors from probing media files.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("ffprobe failed with exit code {exit_code}: {message}")]
    CommandFailed { exit_code: i32, message: String },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Result type for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Probes stream metadata through ffprobe.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    runner: CommandRunner,
}

impl MediaProbe {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Run ffprobe with `-v error` and csv output, returning trimmed stdout.
    fn probe_entry(&self, path: &Path, select: &str, entries: &str) -> ProbeResult<String> {
        if !path.exists() {
            return Err(ProbeError::FileNotFound(path.display().to_string()));
        }

        let path_str = path.display().to_string();
        let args = [
            "-v",
            "error",
            "-select_streams",
            select,
            "-show_entries",
            entries,
            "-of",
            "csv=p=0",
            path_str.as_str(),
        ];

        let output = self.runner.run("ffprobe", &args)?;
        if !output.success() {
            return Err(ProbeError::CommandFailed {
                exit_code: output.exit_code,
                message: output.stderr_tail(),
            });
        }

        Ok(output.stdout.trim().to_string())
    }

    /// Detect the primary video stream's bit depth.
    ///
    /// Inspects `bits_per_raw_sample` and the pixel format name; a "10" in
    /// either (e.g. `yuv420p10le`) means 10-bit content. Probe failures
    /// downgrade to `Unknown` with a warning, never an error.
    pub fn detect_bit_depth(&self, path: &Path) -> BitDepth {
        match self.probe_entry(path, "v:0", "stream=bits_per_raw_sample,pix_fmt") {
            Ok(out) if out.contains("10") || out.contains("p10") => {
                tracing::info!("Detected 10-bit content: {}", path.display());
                BitDepth::Ten
            }
            Ok(out) if !out.is_empty() => BitDepth::Eight,
            Ok(_) => BitDepth::Unknown,
            Err(e) => {
                tracing::warn!(
                    "Could not determine bit depth for {}: {}",
                    path.display(),
                    e
                );
                BitDepth::Unknown
            }
        }
    }

    /// Detect the codec of the first subtitle stream.
    ///
    /// Only stream `s:0` is ever considered, even when more exist; this is
    /// a deliberate limitation, not an oversight. No subtitle stream (or a
    /// failed probe, downgraded with a warning) yields `None`.
    pub fn detect_subtitle_codec(&self, path: &Path) -> Option<SubtitleCodec> {
        match self.probe_entry(path, "s:0", "stream=codec_name") {
            Ok(name) if !name.is_empty() => {
                let codec = SubtitleCodec::from_codec_name(&name);
                tracing::info!("Detected subtitle codec for {}: {}", path.display(), codec);
                Some(codec)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    "Subtitle probe failed for {}, treating as no subtitles: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }
}
