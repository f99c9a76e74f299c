//! Batch runner for processing every discovered asset through the
//! standard pipeline.
//!
//! Assets are isolated from each other: a failed asset is logged,
//! recorded in the summary, and the batch moves on. Temp artifacts are
//! removed even when the pipeline aborts partway, so a transcode crash
//! cannot strand a half-written MKV under the temp root.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::BatchConfig;
use crate::discovery::discover_assets;
use crate::logging::AssetLogger;
use crate::models::{AssetResult, BatchSummary, VideoAsset};

use super::create_standard_pipeline;
use super::pipeline::CancelHandle;
use super::types::{AssetState, Context, ProgressCallback};

/// Errors that abort the whole batch before any asset runs.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Discovery(#[from] crate::discovery::DiscoveryError),
}

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Runs a batch of assets through the standard pipeline sequentially.
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Process every asset under the configured source root.
    ///
    /// Validates the config, discovers assets, and runs each through the
    /// pipeline in relative-path order. A cancel handle stops processing
    /// between assets; the in-flight asset finishes (including cleanup).
    pub fn run<G>(
        &self,
        progress_factory: G,
        cancel_handle: Option<&CancelHandle>,
    ) -> BatchResult<BatchSummary>
    where
        G: Fn(&VideoAsset) -> Option<ProgressCallback>,
    {
        self.config.validate()?;
        let assets = discover_assets(&self.config.source_root)?;

        tracing::info!(
            "Found {} video file(s) under {}",
            assets.len(),
            self.config.source_root.display()
        );

        let mut summary = BatchSummary::new();

        for (i, asset) in assets.iter().enumerate() {
            if let Some(handle) = cancel_handle {
                if handle.is_cancelled() {
                    tracing::info!("Batch cancelled at asset {}/{}", i + 1, assets.len());
                    break;
                }
            }

            tracing::info!(
                "Processing {}/{}: {}",
                i + 1,
                assets.len(),
                asset.display_name()
            );

            let progress = progress_factory(asset);
            summary.push(self.process_asset(asset, progress));
        }

        Ok(summary)
    }

    /// Run one asset through the standard pipeline.
    ///
    /// Never propagates pipeline errors: they become the asset's error
    /// string. Leftover temp artifacts are swept if the pipeline aborted
    /// before its cleanup step ran.
    pub fn process_asset(
        &self,
        asset: &VideoAsset,
        progress_callback: Option<ProgressCallback>,
    ) -> AssetResult {
        let asset_name = asset.display_name();

        let logger = match AssetLogger::new(&asset_name, &self.config.logs_folder) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                let mut result = AssetResult::new(&asset_name);
                result.error = Some(format!("Failed to create log file: {}", e));
                return result;
            }
        };

        let mut ctx = Context::new(self.config.clone(), asset.clone(), logger);
        if let Some(callback) = progress_callback {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = AssetState::new();
        let pipeline = create_standard_pipeline(&self.config);

        ctx.logger
            .info(&format!("Starting asset: {}", asset.source_path.display()));

        let error = match pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                ctx.logger.info(&format!(
                    "Finished ({} step(s) completed, {} skipped)",
                    run_result.steps_completed.len(),
                    run_result.steps_skipped.len()
                ));
                None
            }
            Err(e) => {
                let message = e.to_string();
                ctx.logger.error(&message);
                Some(message)
            }
        };

        if !state.cleaned_up {
            self.sweep_temp_artifacts(&ctx);
            state.cleaned_up =
                !ctx.mkv_path.exists() && !ctx.srt_path.exists();
        }

        ctx.logger.flush();
        state.into_result(&asset_name, error)
    }

    /// Remove temp artifacts left behind by an aborted pipeline.
    fn sweep_temp_artifacts(&self, ctx: &Context) {
        for path in [
            ctx.mkv_path.as_path(),
            ctx.srt_path.as_path(),
            &ctx.srt_path.with_extension("ass"),
        ] {
            remove_quietly(ctx, path);
        }
    }
}

fn remove_quietly(ctx: &Context, path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        ctx.logger
            .warn(&format!("Could not remove {}: {}", path.display(), e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncodeMode, TransferMethod};

    fn config_for(dir: &Path) -> BatchConfig {
        BatchConfig {
            source_root: dir.join("src"),
            dest_host: "media-host".to_string(),
            dest_folder: "/srv/media".to_string(),
            bitrate: "2M".to_string(),
            encode_mode: EncodeMode::SoftwareOnly,
            username: "ferry".to_string(),
            password: None,
            transfer_method: TransferMethod::Sftp,
            temp_root: dir.join("tmp"),
            logs_folder: dir.join("logs"),
            tool_timeout_secs: 5,
        }
    }

    #[test]
    fn empty_source_yields_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();

        let runner = BatchRunner::new(config_for(dir.path()));
        let summary = runner.run(|_| None, None).unwrap();

        assert_eq!(summary.assets.len(), 0);
        assert!(summary.all_succeeded());
    }

    #[test]
    fn cancelled_handle_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("movie.mp4"), b"not a real video").unwrap();

        let handle = CancelHandle::new();
        handle.cancel();

        let runner = BatchRunner::new(config_for(dir.path()));
        let summary = runner.run(|_| None, Some(&handle)).unwrap();

        assert_eq!(summary.assets.len(), 0);
    }

    #[test]
    fn missing_source_root_is_a_batch_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(config_for(dir.path()));

        assert!(runner.run(|_| None, None).is_err());
    }
}
