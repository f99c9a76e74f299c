//! Transfer step - uploads the MKV (and SRT when present) to the
//! destination host.
//!
//! Each artifact upload is an independent attempt: a failed MKV upload
//! still lets the SRT try, and every attempt lands in
//! `AssetState.transfers` as an outcome. The asset is judged failed at
//! result time if any upload failed, but the step itself never errors,
//! so cleanup always runs.

use crate::models::{Credentials, TransferOutcome, TransferTask};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::pipeline::PipelineStep;
use crate::orchestrator::types::{AssetState, Context, StepOutcome};
use crate::runner::CommandRunner;
use crate::transfer::RemoteTransferAgent;

/// Transfer step that pushes artifacts over SFTP with SCP fallback.
pub struct TransferStep {
    agent: RemoteTransferAgent,
}

impl TransferStep {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            agent: RemoteTransferAgent::new(runner),
        }
    }

    fn upload_one(&self, ctx: &Context, task: TransferTask) -> TransferOutcome {
        ctx.logger.info(&format!(
            "Uploading {} -> {}:{}",
            task.local_path.display(),
            task.host,
            task.remote_path
        ));

        match self.agent.transfer(&task) {
            Ok(()) => {
                ctx.logger
                    .success(&format!("Uploaded {}", task.remote_path));
                TransferOutcome::success(task.remote_path)
            }
            Err(e) => {
                ctx.logger
                    .error(&format!("Upload of {} failed: {}", task.remote_path, e));
                TransferOutcome::failure(task.remote_path, e.to_string())
            }
        }
    }
}

impl PipelineStep for TransferStep {
    fn name(&self) -> &str {
        "Transfer"
    }

    fn validate_input(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        if !state.has_transcode() {
            return Err(StepError::invalid_input(
                "Transfer requires an encoded artifact",
            ));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut AssetState) -> StepResult<StepOutcome> {
        let credentials = Credentials::new(
            ctx.config.username.clone(),
            ctx.config.password.clone(),
        );

        let mkv_remote = ctx
            .asset
            .remote_artifact_path(&ctx.config.dest_folder, "mkv");
        let mkv_task = TransferTask::new(
            ctx.mkv_path.clone(),
            ctx.config.dest_host.clone(),
            mkv_remote,
            credentials.clone(),
            ctx.config.transfer_method,
        );
        let outcome = self.upload_one(ctx, mkv_task);
        state.transfers.push(outcome);

        if let Some(srt_path) = state.srt_artifact().cloned() {
            let srt_remote = ctx
                .asset
                .remote_artifact_path(&ctx.config.dest_folder, "srt");
            let srt_task = TransferTask::new(
                srt_path,
                ctx.config.dest_host.clone(),
                srt_remote,
                credentials,
                ctx.config.transfer_method,
            );
            let outcome = self.upload_one(ctx, srt_task);
            state.transfers.push(outcome);
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &AssetState) -> StepResult<()> {
        if state.transfers.is_empty() {
            return Err(StepError::invalid_output("No transfer outcomes recorded"));
        }
        Ok(())
    }
}
