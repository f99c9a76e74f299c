//! SFTP session transfer (libssh2).
//!
//! Connect with a bounded TCP timeout, authenticate per the credential
//! policy, walk the remote directory chain root-to-leaf with a tri-state
//! existence check, then stream the artifact up.

use std::fs::File;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use ssh2::{Session, Sftp};

use crate::models::{Credentials, TransferTask};

use super::{parent_chain, AuthError, AuthPlan, TransferError, TransferResult};

/// TCP connect timeout for the session.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Blocking-operation timeout applied to the whole session, so a stalled
/// remote cannot hang the batch.
const SESSION_TIMEOUT_MS: u32 = 120_000;

/// Result of asking whether a remote directory exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteDirState {
    Exists,
    Absent,
    /// The query itself failed; creation is still attempted.
    QueryFailed,
}

/// SFTP upload client.
pub struct SftpClient;

impl SftpClient {
    pub fn new() -> Self {
        Self
    }

    /// Run the full SFTP sequence for one task:
    /// connect → authenticate → mkdir-parents → upload.
    pub fn upload(&self, task: &TransferTask) -> TransferResult<()> {
        let session = self.connect(&task.host)?;
        self.authenticate(&session, &task.host, &task.credentials)?;

        let sftp = session.sftp()?;

        let remote_dir = task.remote_parent();
        self.ensure_remote_dir(&sftp, &remote_dir)?;

        self.put_file(&sftp, task)?;

        tracing::info!(
            "Uploaded {} to {}:{}",
            task.local_path.display(),
            task.host,
            task.remote_path
        );
        Ok(())
    }

    fn connect(&self, host: &str) -> TransferResult<Session> {
        let addrs: Vec<_> = (host, 22)
            .to_socket_addrs()
            .map_err(|e| TransferError::ConnectFailed {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .collect();

        let addr = addrs.first().ok_or_else(|| TransferError::ConnectFailed {
            host: host.to_string(),
            message: "hostname resolved to no addresses".to_string(),
        })?;

        let tcp = TcpStream::connect_timeout(addr, CONNECT_TIMEOUT).map_err(|e| {
            TransferError::ConnectFailed {
                host: host.to_string(),
                message: e.to_string(),
            }
        })?;

        let mut session = Session::new()?;
        session.set_timeout(SESSION_TIMEOUT_MS);
        session.set_tcp_stream(tcp);
        session.handshake()?;
        Ok(session)
    }

    /// Authenticate per the credential policy: an explicit password is
    /// used exclusively; otherwise key candidates are tried in order and
    /// the first key that authenticates wins.
    fn authenticate(
        &self,
        session: &Session,
        host: &str,
        credentials: &Credentials,
    ) -> TransferResult<()> {
        match AuthPlan::from_credentials(credentials) {
            AuthPlan::Password(password) => {
                tracing::info!(
                    "Attempting password authentication for {}@{}",
                    credentials.username,
                    host
                );
                session
                    .userauth_password(&credentials.username, &password)
                    .map_err(|e| {
                        AuthError::PasswordRejected {
                            username: credentials.username.clone(),
                            host: host.to_string(),
                            message: e.to_string(),
                        }
                        .into()
                    })
            }
            AuthPlan::Keys(candidates) => {
                self.authenticate_with_keys(session, host, &credentials.username, &candidates)
            }
        }
    }

    fn authenticate_with_keys(
        &self,
        session: &Session,
        host: &str,
        username: &str,
        candidates: &[std::path::PathBuf],
    ) -> TransferResult<()> {
        tracing::info!("Attempting key-based authentication for {}@{}", username, host);

        let mut tried = Vec::new();
        for key_path in candidates {
            if !key_path.exists() {
                tracing::debug!("Key file not found: {}", key_path.display());
                continue;
            }

            tried.push(key_path.display().to_string());
            match session.userauth_pubkey_file(username, None, key_path, None) {
                Ok(()) if session.authenticated() => {
                    tracing::info!(
                        "Key authentication successful using {}",
                        key_path.display()
                    );
                    return Ok(());
                }
                Ok(()) => {}
                Err(e) => {
                    tracing::debug!(
                        "Failed to authenticate with key {}: {}",
                        key_path.display(),
                        e
                    );
                }
            }
        }

        if tried.is_empty() {
            return Err(AuthError::NoKeysAvailable.into());
        }
        Err(AuthError::AllKeysFailed {
            username: username.to_string(),
            host: host.to_string(),
            tried: tried.join(", "),
        }
        .into())
    }

    /// Create the remote directory chain root-to-leaf.
    ///
    /// Each component gets a tri-state existence query; creation is
    /// attempted for absent (or unqueryable) components. An mkdir failure
    /// is tolerated when a re-check shows the directory exists, since a
    /// concurrent actor creating it between check and create still leaves
    /// the chain in place.
    fn ensure_remote_dir(&self, sftp: &Sftp, remote_dir: &str) -> TransferResult<()> {
        for component in parent_chain(remote_dir) {
            let path = Path::new(&component);
            match self.dir_state(sftp, path) {
                RemoteDirState::Exists => continue,
                RemoteDirState::Absent | RemoteDirState::QueryFailed => {
                    if let Err(e) = sftp.mkdir(path, 0o755) {
                        if self.dir_state(sftp, path) != RemoteDirState::Exists {
                            return Err(TransferError::RemoteMkdirFailed {
                                path: component,
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn dir_state(&self, sftp: &Sftp, path: &Path) -> RemoteDirState {
        match sftp.stat(path) {
            Ok(_) => RemoteDirState::Exists,
            // libssh2 reports "no such file" as an SFTP protocol error;
            // anything else is a failed query.
            Err(e) if e.code() == ssh2::ErrorCode::SFTP(2) => RemoteDirState::Absent,
            Err(_) => RemoteDirState::QueryFailed,
        }
    }

    fn put_file(&self, sftp: &Sftp, task: &TransferTask) -> TransferResult<()> {
        let mut local = File::open(&task.local_path).map_err(|e| TransferError::UploadFailed {
            local: task.local_path.display().to_string(),
            remote: task.remote_path.clone(),
            message: e.to_string(),
        })?;

        let mut remote =
            sftp.create(Path::new(&task.remote_path))
                .map_err(|e| TransferError::UploadFailed {
                    local: task.local_path.display().to_string(),
                    remote: task.remote_path.clone(),
                    message: e.to_string(),
                })?;

        io::copy(&mut local, &mut remote).map_err(|e| TransferError::UploadFailed {
            local: task.local_path.display().to_string(),
            remote: task.remote_path.clone(),
            message: e.to_string(),
        })?;

        Ok(())
    }
}

impl Default for SftpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferMethod;
    use std::path::PathBuf;

    #[test]
    fn unreachable_host_is_connect_error() {
        let client = SftpClient::new();
        // .invalid is reserved and never resolves.
        let result = client.connect("sftp-test.invalid");
        assert!(matches!(result, Err(TransferError::ConnectFailed { .. })));
    }

    #[test]
    fn upload_requires_reachable_host() {
        let client = SftpClient::new();
        let task = TransferTask::new(
            PathBuf::from("/tmp/nonexistent.mkv"),
            "host.invalid",
            "/d/a.mkv",
            Credentials::new("user", None),
            TransferMethod::Sftp,
        );
        assert!(client.upload(&task).is_err());
    }
}
