//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::BatchConfig;
use crate::logging::AssetLogger;
use crate::models::{AssetResult, BitDepth, SubtitleCodec, TransferOutcome, VideoAsset};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the asset, its precomputed artifact paths, and shared
/// resources that steps can read but not modify. Mutable state goes in
/// `AssetState`.
pub struct Context {
    /// Batch configuration.
    pub config: BatchConfig,
    /// The asset being processed (unprobed; detections land in state).
    pub asset: VideoAsset,
    /// Local MKV output path under the temp root.
    pub mkv_path: PathBuf,
    /// Local SRT output path under the temp root.
    pub srt_path: PathBuf,
    /// Per-asset logger.
    pub logger: Arc<AssetLogger>,
    /// Optional progress callback.
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a context for one asset, deriving its artifact paths from
    /// the relative stem.
    pub fn new(config: BatchConfig, asset: VideoAsset, logger: Arc<AssetLogger>) -> Self {
        let mkv_path = asset.temp_artifact_path(&config.temp_root, "mkv");
        let srt_path = asset.temp_artifact_path(&config.temp_root, "srt");
        Self {
            config,
            asset,
            mkv_path,
            srt_path,
            logger,
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to the callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }
}

/// Results of the probe step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutput {
    pub bit_depth: BitDepth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_codec: Option<SubtitleCodec>,
}

/// Results of the transcode step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOutput {
    /// Path of the produced MKV.
    pub mkv_path: PathBuf,
    /// Encoder that produced it.
    pub encoder: String,
}

/// Results of the subtitle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleOutput {
    /// Path of the produced SRT, when extraction succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_path: Option<PathBuf>,
}

/// Mutable state that accumulates results from pipeline steps.
///
/// Steps add their output in their own section and do not overwrite
/// earlier sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetState {
    /// Probe results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeOutput>,
    /// Transcode results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode: Option<TranscodeOutput>,
    /// Subtitle extraction results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitleOutput>,
    /// Transfer outcomes in upload order.
    #[serde(default)]
    pub transfers: Vec<TransferOutcome>,
    /// Whether cleanup ran.
    #[serde(default)]
    pub cleaned_up: bool,
}

impl AssetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_probe(&self) -> bool {
        self.probe.is_some()
    }

    pub fn has_transcode(&self) -> bool {
        self.transcode.is_some()
    }

    /// The asset with probe detections applied, for building jobs.
    pub fn probed_asset(&self, asset: &VideoAsset) -> VideoAsset {
        let mut probed = asset.clone();
        if let Some(probe) = &self.probe {
            probed.bit_depth = probe.bit_depth;
            probed.subtitle_codec = probe.subtitle_codec.clone();
        }
        probed
    }

    /// SRT path when extraction produced one.
    pub fn srt_artifact(&self) -> Option<&PathBuf> {
        self.subtitles.as_ref().and_then(|s| s.srt_path.as_ref())
    }

    /// Fold the accumulated state into a per-asset result.
    pub fn into_result(self, asset_name: &str, error: Option<String>) -> AssetResult {
        AssetResult {
            asset: asset_name.to_string(),
            mkv_path: self.transcode.map(|t| t.mkv_path),
            srt_path: self.subtitles.and_then(|s| s.srt_path),
            transfers: self.transfers,
            error,
            cleaned_up: self.cleaned_up,
        }
    }
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (does not apply to this asset, not an error).
    Skipped(String),
}
