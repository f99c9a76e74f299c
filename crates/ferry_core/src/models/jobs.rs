//! Job descriptions handed to the pipeline components.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::{EncodeMode, TransferMethod};
use super::media::VideoAsset;

/// A transcode request for one asset.
///
/// Produces exactly one MKV artifact or a fatal (per-asset) error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// The probed source asset.
    pub asset: VideoAsset,
    /// Target video bitrate (e.g. "2M").
    ///
    /// Advisory in both encode paths: the software path is CRF-constrained
    /// with this value as a cap, and hardware rate control treats it as a
    /// target. Callers must not assume the output hits it exactly.
    pub bitrate: String,
    /// Encoder selection policy.
    pub mode: EncodeMode,
    /// Output MKV path under the temp root.
    pub output_path: PathBuf,
}

impl TranscodeJob {
    pub fn new(
        asset: VideoAsset,
        bitrate: impl Into<String>,
        mode: EncodeMode,
        output_path: PathBuf,
    ) -> Self {
        Self {
            asset,
            bitrate: bitrate.into(),
            mode,
            output_path,
        }
    }
}

/// A subtitle extraction request for one asset.
///
/// Produces zero or one SRT artifact; never fatal to the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleJob {
    /// The probed source asset.
    pub asset: VideoAsset,
    /// Output SRT path under the temp root.
    pub output_path: PathBuf,
}

impl SubtitleJob {
    pub fn new(asset: VideoAsset, output_path: PathBuf) -> Self {
        Self { asset, output_path }
    }

    /// Temporary native-format path used by the style-family two-step path.
    pub fn native_temp_path(&self) -> PathBuf {
        self.output_path.with_extension("ass")
    }
}

/// Credentials for a remote transfer.
///
/// An explicit password is used exclusively; the key-candidate list is
/// only consulted when no password is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Remote username.
    pub username: String,
    /// Optional password; when set, key auth is never attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Whether to use password authentication exclusively.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// An upload request for one local artifact.
///
/// Produces a success/failure outcome; never raises past the asset boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTask {
    /// Local artifact to upload.
    pub local_path: PathBuf,
    /// Remote hostname.
    pub host: String,
    /// Full remote destination path (POSIX).
    pub remote_path: String,
    /// Credential set.
    pub credentials: Credentials,
    /// Preferred protocol; Sftp falls back to Scp, Scp is terminal.
    pub method: TransferMethod,
}

impl TransferTask {
    pub fn new(
        local_path: PathBuf,
        host: impl Into<String>,
        remote_path: impl Into<String>,
        credentials: Credentials,
        method: TransferMethod,
    ) -> Self {
        Self {
            local_path,
            host: host.into(),
            remote_path: remote_path.into(),
            credentials,
            method,
        }
    }

    /// Parent directory of the remote path (POSIX semantics).
    pub fn remote_parent(&self) -> String {
        match self.remote_path.rfind('/') {
            Some(0) => "/".to_string(),
            Some(idx) => self.remote_path[..idx].to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_temp_path_swaps_extension() {
        let asset = VideoAsset::new("/v/a.mkv", "a.mkv");
        let job = SubtitleJob::new(asset, PathBuf::from("/tmp/x/a.srt"));
        assert_eq!(job.native_temp_path(), PathBuf::from("/tmp/x/a.ass"));
    }

    #[test]
    fn remote_parent_posix() {
        let task = TransferTask::new(
            PathBuf::from("/tmp/x/a/b.mkv"),
            "host",
            "/d/a/b.mkv",
            Credentials::new("user", None),
            TransferMethod::Sftp,
        );
        assert_eq!(task.remote_parent(), "/d/a");
    }

    #[test]
    fn remote_parent_of_root_child_is_root() {
        let task = TransferTask::new(
            PathBuf::from("/tmp/b.mkv"),
            "host",
            "/b.mkv",
            Credentials::new("user", None),
            TransferMethod::Sftp,
        );
        assert_eq!(task.remote_parent(), "/");
    }
}
