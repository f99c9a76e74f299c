//! Remote artifact transfer.
//!
//! Primary path is an authenticated SFTP session (connect, authenticate,
//! ensure the remote directory chain, upload). Any failure at any stage
//! triggers exactly one fallback to shell-invoked ssh/scp with the same
//! credential policy. Only exhaustion of both protocols surfaces as a
//! failed task, and even that never aborts the batch.

mod scp;
mod sftp;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{Credentials, TransferMethod, TransferTask};
use crate::runner::CommandRunner;

pub use scp::ScpFallback;
pub use sftp::SftpClient;

/// Authentication failure: every credential candidate was exhausted.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password authentication failed for {username}@{host}: {message}")]
    PasswordRejected {
        username: String,
        host: String,
        message: String,
    },

    #[error("No SSH key authenticated for {username}@{host} (tried: {tried})")]
    AllKeysFailed {
        username: String,
        host: String,
        tried: String,
    },

    #[error("No SSH key candidates found on disk")]
    NoKeysAvailable,
}

/// Errors from a single protocol attempt.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to connect to {host}:22: {message}")]
    ConnectFailed { host: String, message: String },

    #[error("SSH session error: {0}")]
    Session(#[from] ssh2::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Failed to create remote directory {path}: {message}")]
    RemoteMkdirFailed { path: String, message: String },

    #[error("Upload of {local} to {remote} failed: {message}")]
    UploadFailed {
        local: String,
        remote: String,
        message: String,
    },

    #[error("Local artifact not found: {0}")]
    LocalFileNotFound(String),

    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error(transparent)]
    Runner(#[from] crate::runner::RunnerError),
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// How a task will authenticate.
///
/// An explicit password is used exclusively; the key-candidate list is
/// never consulted in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPlan {
    /// Password auth only.
    Password(String),
    /// Ordered private-key candidates; first successful key wins.
    Keys(Vec<PathBuf>),
}

impl AuthPlan {
    /// Derive the plan from a credential set.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        match &credentials.password {
            Some(password) => AuthPlan::Password(password.clone()),
            None => AuthPlan::Keys(default_key_candidates()),
        }
    }
}

/// Ordered local private-key candidates: `~/.ssh/id_rsa` first, then
/// `~/.ssh/id_ed25519`.
pub fn default_key_candidates() -> Vec<PathBuf> {
    let Some(dirs) = directories::BaseDirs::new() else {
        return Vec::new();
    };
    let ssh_dir = dirs.home_dir().join(".ssh");
    vec![ssh_dir.join("id_rsa"), ssh_dir.join("id_ed25519")]
}

/// A protocol attempt that can move one artifact.
pub(crate) trait Uploader: Send + Sync {
    fn upload(&self, task: &TransferTask) -> TransferResult<()>;
}

impl Uploader for SftpClient {
    fn upload(&self, task: &TransferTask) -> TransferResult<()> {
        SftpClient::upload(self, task)
    }
}

impl Uploader for ScpFallback {
    fn upload(&self, task: &TransferTask) -> TransferResult<()> {
        ScpFallback::upload(self, task)
    }
}

/// Uploads local artifacts to a remote host with protocol fallback.
pub struct RemoteTransferAgent {
    sftp: Box<dyn Uploader>,
    scp: Box<dyn Uploader>,
}

impl RemoteTransferAgent {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            sftp: Box::new(SftpClient::new()),
            scp: Box::new(ScpFallback::new(runner)),
        }
    }

    #[cfg(test)]
    fn with_uploaders(sftp: Box<dyn Uploader>, scp: Box<dyn Uploader>) -> Self {
        Self { sftp, scp }
    }

    /// Run one transfer task to completion.
    ///
    /// SFTP preference: attempt the session end-to-end, and on any failure
    /// make exactly one SCP attempt. SCP preference skips the session
    /// entirely. The returned error is the terminal one.
    pub fn transfer(&self, task: &TransferTask) -> TransferResult<()> {
        if !task.local_path.exists() {
            return Err(TransferError::LocalFileNotFound(
                task.local_path.display().to_string(),
            ));
        }

        match task.method {
            TransferMethod::Sftp => match self.sftp.upload(task) {
                Ok(()) => Ok(()),
                Err(e) => {
                    tracing::warn!(
                        "SFTP transfer of {} failed ({}), trying SCP instead",
                        task.local_path.display(),
                        e
                    );
                    self.scp.upload(task)
                }
            },
            TransferMethod::Scp => self.scp.upload(task),
        }
    }
}

/// Directory chain from root to leaf for a POSIX path.
///
/// `/d/a/b` yields `["/d", "/d/a", "/d/a/b"]`. A relative destination
/// stays relative (`media/a` yields `["media", "media/a"]`), since the
/// SFTP server resolves it against the login home just as scp does.
/// Root and empty input yield nothing to create.
pub(crate) fn parent_chain(path: &str) -> Vec<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    let absolute = trimmed.starts_with('/');

    let mut chain = Vec::new();
    let mut current = String::new();
    for part in trimmed.split('/').filter(|p| !p.is_empty()) {
        if !current.is_empty() || absolute {
            current.push('/');
        }
        current.push_str(part);
        chain.push(current.clone());
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingUploader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingUploader {
        fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail,
                },
                calls,
            )
        }
    }

    impl Uploader for CountingUploader {
        fn upload(&self, task: &TransferTask) -> TransferResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransferError::ConnectFailed {
                    host: task.host.clone(),
                    message: "refused".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn local_task(dir: &tempfile::TempDir, method: TransferMethod) -> TransferTask {
        let local = dir.path().join("a.mkv");
        std::fs::write(&local, b"x").unwrap();
        TransferTask::new(
            local,
            "host",
            "/d/a.mkv",
            Credentials::new("user", None),
            method,
        )
    }

    #[test]
    fn sftp_failure_triggers_exactly_one_scp_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let (sftp, sftp_calls) = CountingUploader::new(true);
        let (scp, scp_calls) = CountingUploader::new(false);
        let agent = RemoteTransferAgent::with_uploaders(Box::new(sftp), Box::new(scp));

        let result = agent.transfer(&local_task(&dir, TransferMethod::Sftp));

        assert!(result.is_ok());
        assert_eq!(sftp_calls.load(Ordering::SeqCst), 1);
        assert_eq!(scp_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exhausting_both_protocols_surfaces_the_scp_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sftp, sftp_calls) = CountingUploader::new(true);
        let (scp, scp_calls) = CountingUploader::new(true);
        let agent = RemoteTransferAgent::with_uploaders(Box::new(sftp), Box::new(scp));

        let result = agent.transfer(&local_task(&dir, TransferMethod::Sftp));

        assert!(result.is_err());
        // One attempt per protocol, never more.
        assert_eq!(sftp_calls.load(Ordering::SeqCst), 1);
        assert_eq!(scp_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scp_preference_never_touches_sftp() {
        let dir = tempfile::tempdir().unwrap();
        let (sftp, sftp_calls) = CountingUploader::new(false);
        let (scp, scp_calls) = CountingUploader::new(false);
        let agent = RemoteTransferAgent::with_uploaders(Box::new(sftp), Box::new(scp));

        agent
            .transfer(&local_task(&dir, TransferMethod::Scp))
            .unwrap();

        assert_eq!(sftp_calls.load(Ordering::SeqCst), 0);
        assert_eq!(scp_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_local_file_attempts_no_protocol() {
        let (sftp, sftp_calls) = CountingUploader::new(false);
        let (scp, scp_calls) = CountingUploader::new(false);
        let agent = RemoteTransferAgent::with_uploaders(Box::new(sftp), Box::new(scp));

        let task = TransferTask::new(
            std::path::PathBuf::from("/nonexistent/a.mkv"),
            "host",
            "/d/a.mkv",
            Credentials::new("user", None),
            TransferMethod::Sftp,
        );

        assert!(matches!(
            agent.transfer(&task),
            Err(TransferError::LocalFileNotFound(_))
        ));
        assert_eq!(sftp_calls.load(Ordering::SeqCst), 0);
        assert_eq!(scp_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn password_is_exclusive() {
        let creds = Credentials::new("user", Some("secret".to_string()));
        assert_eq!(
            AuthPlan::from_credentials(&creds),
            AuthPlan::Password("secret".to_string())
        );
    }

    #[test]
    fn key_candidates_ordered_rsa_first() {
        let creds = Credentials::new("user", None);
        match AuthPlan::from_credentials(&creds) {
            AuthPlan::Keys(keys) => {
                // Order matters: id_rsa is tried before id_ed25519.
                let names: Vec<_> = keys
                    .iter()
                    .filter_map(|k| k.file_name().and_then(|n| n.to_str()))
                    .collect();
                assert_eq!(names, vec!["id_rsa", "id_ed25519"]);
            }
            other => panic!("expected key plan, got {:?}", other),
        }
    }

    #[test]
    fn parent_chain_walks_root_to_leaf() {
        assert_eq!(parent_chain("/d/a/b"), vec!["/d", "/d/a", "/d/a/b"]);
        assert_eq!(parent_chain("/d/"), vec!["/d"]);
        assert!(parent_chain("/").is_empty());
        assert!(parent_chain("").is_empty());
    }

    #[test]
    fn parent_chain_keeps_relative_paths_relative() {
        // Home-relative destinations must stay home-relative, so the
        // mkdir walk targets the same directories scp would.
        assert_eq!(parent_chain("media/a"), vec!["media", "media/a"]);
        assert_eq!(parent_chain("media"), vec!["media"]);
        assert_eq!(parent_chain("media/"), vec!["media"]);
    }
}
