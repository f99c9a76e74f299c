//! Shell-invoked scp fallback.
//!
//! Remote directory creation via `ssh ... mkdir -p`, then `scp`. When a
//! password is supplied and `sshpass` is on PATH both commands are wrapped
//! with it; without sshpass the commands run anyway and key auth (or an
//! agent) has to carry them, matching the original tool's behavior.

use crate::models::TransferTask;
use crate::runner::CommandRunner;

use super::{TransferError, TransferResult};

/// SCP-based upload used as the secondary protocol.
pub struct ScpFallback {
    runner: CommandRunner,
}

impl ScpFallback {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Create the remote parent directory, then copy the file.
    pub fn upload(&self, task: &TransferTask) -> TransferResult<()> {
        let use_sshpass = self.password_helper_available(task);

        let user_host = format!("{}@{}", task.credentials.username, task.host);
        let remote_dir = task.remote_parent();
        let mkdir_arg = format!("mkdir -p '{}'", remote_dir);
        let scp_target = format!("{}:{}", user_host, task.remote_path);
        let local = task.local_path.display().to_string();

        let mkdir_cmd = vec!["ssh".to_string(), user_host.clone(), mkdir_arg];
        let scp_cmd = vec!["scp".to_string(), local, scp_target];

        self.run_remote(&mkdir_cmd, use_sshpass, task)?;
        self.run_remote(&scp_cmd, use_sshpass, task)?;

        tracing::info!(
            "Uploaded {} to {}:{} via scp",
            task.local_path.display(),
            task.host,
            task.remote_path
        );
        Ok(())
    }

    /// Whether to wrap commands with sshpass. Warns when a password was
    /// supplied but sshpass is missing.
    fn password_helper_available(&self, task: &TransferTask) -> bool {
        if !task.credentials.has_password() {
            return false;
        }
        match which::which("sshpass") {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(
                    "sshpass not found; password authentication may not work with scp. \
                     Install sshpass or use key-based authentication."
                );
                false
            }
        }
    }

    fn run_remote(
        &self,
        cmd: &[String],
        use_sshpass: bool,
        task: &TransferTask,
    ) -> TransferResult<()> {
        let mut full: Vec<String> = Vec::new();
        if use_sshpass {
            // has_password() was checked before use_sshpass could be true
            let password = task.credentials.password.clone().unwrap_or_default();
            full.push("sshpass".to_string());
            full.push("-p".to_string());
            full.push(password);
        }
        full.extend(cmd.iter().cloned());

        let args: Vec<&str> = full[1..].iter().map(|s| s.as_str()).collect();
        let output = self.runner.run(&full[0], &args)?;

        if !output.success() {
            return Err(TransferError::CommandFailed {
                tool: cmd[0].clone(),
                exit_code: output.exit_code,
                message: output.stderr_tail(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credentials, TransferMethod};
    use std::path::PathBuf;
    use std::time::Duration;

    fn task(password: Option<&str>) -> TransferTask {
        TransferTask::new(
            PathBuf::from("/tmp/x/a/b.mkv"),
            "host",
            "/d/a/b.mkv",
            Credentials::new("user", password.map(|s| s.to_string())),
            TransferMethod::Scp,
        )
    }

    #[test]
    fn no_password_never_uses_sshpass() {
        let fallback = ScpFallback::new(CommandRunner::new(Duration::from_secs(5)));
        assert!(!fallback.password_helper_available(&task(None)));
    }

    #[test]
    fn mkdir_target_quotes_remote_dir() {
        let t = task(None);
        let mkdir_arg = format!("mkdir -p '{}'", t.remote_parent());
        assert_eq!(mkdir_arg, "mkdir -p '/d/a'");
    }
}
