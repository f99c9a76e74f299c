//! Per-asset and batch result aggregates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of a single artifact transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Remote destination path.
    pub remote_path: String,
    /// Whether the upload ultimately succeeded (either protocol).
    pub succeeded: bool,
    /// Failure detail when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn success(remote_path: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(remote_path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate result for one asset.
///
/// Invariant: once `cleaned_up` is set, none of the temp artifact paths
/// recorded here exist on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetResult {
    /// Asset display name (path relative to the scan root).
    pub asset: String,
    /// Path of the transcoded MKV (while it existed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mkv_path: Option<PathBuf>,
    /// Path of the extracted SRT, if one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_path: Option<PathBuf>,
    /// Transfer outcome per artifact, in upload order.
    #[serde(default)]
    pub transfers: Vec<TransferOutcome>,
    /// Fatal error, set only when transcoding exhausted both encoders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether cleanup ran for this asset.
    #[serde(default)]
    pub cleaned_up: bool,
}

impl AssetResult {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            ..Default::default()
        }
    }

    /// An asset succeeds when it transcoded and every transfer landed.
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.transfers.iter().all(|t| t.succeeded)
    }
}

/// Final tally for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// When the batch started (RFC 3339).
    pub started_at: Option<String>,
    /// Per-asset results, in processing order.
    pub assets: Vec<AssetResult>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self {
            started_at: Some(chrono::Local::now().to_rfc3339()),
            assets: Vec::new(),
        }
    }

    pub fn push(&mut self, result: AssetResult) {
        self.assets.push(result);
    }

    pub fn succeeded_count(&self) -> usize {
        self.assets.iter().filter(|a| a.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.assets.len() - self.succeeded_count()
    }

    /// Whether every asset in the batch succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_result_success_requires_all_transfers() {
        let mut result = AssetResult::new("a/b.mp4");
        result.transfers.push(TransferOutcome::success("/d/a/b.mkv"));
        assert!(result.succeeded());

        result
            .transfers
            .push(TransferOutcome::failure("/d/a/b.srt", "connection refused"));
        assert!(!result.succeeded());
    }

    #[test]
    fn fatal_error_fails_asset() {
        let mut result = AssetResult::new("a/b.mp4");
        result.error = Some("both encoders failed".to_string());
        assert!(!result.succeeded());
    }

    #[test]
    fn summary_tallies() {
        let mut summary = BatchSummary::new();
        summary.push(AssetResult::new("ok.mp4"));

        let mut failed = AssetResult::new("bad.mp4");
        failed.error = Some("boom".to_string());
        summary.push(failed);

        assert_eq!(summary.succeeded_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn summary_serializes() {
        let summary = BatchSummary::new();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("started_at"));
    }
}
