//! Batch configuration.
//!
//! One immutable, validated configuration regardless of which entry channel
//! built it (flags or a TOML file). The core consumes it identically either
//! way. Saves are atomic (write to temp file, then rename).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EncodeMode, TransferMethod};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Immutable configuration for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Root directory scanned for video files.
    pub source_root: PathBuf,

    /// Destination hostname.
    pub dest_host: String,

    /// Destination folder on the remote host (POSIX path).
    pub dest_folder: String,

    /// Target video bitrate.
    #[serde(default = "default_bitrate")]
    pub bitrate: String,

    /// Encoder selection policy.
    #[serde(default)]
    pub encode_mode: EncodeMode,

    /// Remote username. Defaults to the local login user when omitted.
    #[serde(default = "default_username")]
    pub username: String,

    /// Optional password; key auth candidates are used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Preferred transfer protocol.
    #[serde(default)]
    pub transfer_method: TransferMethod,

    /// Temp root for transcoded artifacts.
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// Folder for per-asset log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: PathBuf,

    /// Deadline in seconds for each external tool invocation.
    ///
    /// A hung probe/encode/copy is killed when this expires and treated as
    /// a stage failure eligible for the normal fallback chain.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

fn default_bitrate() -> String {
    "2M".to_string()
}

fn default_temp_root() -> PathBuf {
    PathBuf::from("/tmp/transcode")
}

fn default_logs_folder() -> PathBuf {
    PathBuf::from(".logs")
}

fn default_username() -> String {
    local_username().unwrap_or_default()
}

/// The local login user, taken from the environment.
pub fn local_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.trim().is_empty())
}

fn default_tool_timeout_secs() -> u64 {
    // Generous: a long feature encode on slow hardware still finishes.
    4 * 60 * 60
}

impl BatchConfig {
    /// Deadline for external tool invocations as a `Duration`.
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Validate field contents; called once at construction time.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.source_root.is_dir() {
            return Err(ConfigError::Invalid(format!(
                "source root is not a directory: {}",
                self.source_root.display()
            )));
        }
        if self.dest_host.trim().is_empty() {
            return Err(ConfigError::Invalid("destination host is required".into()));
        }
        if self.dest_folder.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "destination folder is required".into(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username is required".into()));
        }
        if self.bitrate.trim().is_empty() {
            return Err(ConfigError::Invalid("bitrate must not be empty".into()));
        }
        if self.tool_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tool timeout must be at least one second".into(),
            ));
        }
        Ok(())
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save the config as TOML, atomically (temp file then rename).
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;

        let temp_path = path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config(source_root: PathBuf) -> BatchConfig {
        BatchConfig {
            source_root,
            dest_host: "media-box".to_string(),
            dest_folder: "/srv/media".to_string(),
            bitrate: default_bitrate(),
            encode_mode: EncodeMode::SoftwareOnly,
            username: "ferry".to_string(),
            password: None,
            transfer_method: TransferMethod::Sftp,
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }

    #[test]
    fn validates_good_config() {
        let dir = tempdir().unwrap();
        let config = valid_config(dir.path().to_path_buf());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_missing_source_root() {
        let config = valid_config(PathBuf::from("/nonexistent/source/root"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_host() {
        let dir = tempdir().unwrap();
        let mut config = valid_config(dir.path().to_path_buf());
        config.dest_host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempdir().unwrap();
        let config = valid_config(dir.path().to_path_buf());

        let path = dir.path().join("ferry.toml");
        config.save(&path).unwrap();
        let loaded = BatchConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(!dir.path().join("ferry.toml.tmp").exists());
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let dir = tempdir().unwrap();
        let toml_str = format!(
            "source_root = {:?}\ndest_host = \"h\"\ndest_folder = \"/d\"\nusername = \"u\"\n",
            dir.path()
        );
        let config: BatchConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.bitrate, "2M");
        assert_eq!(config.transfer_method, TransferMethod::Sftp);
        assert_eq!(config.temp_root, PathBuf::from("/tmp/transcode"));
    }

    #[test]
    fn omitted_username_defaults_to_local_user() {
        std::env::set_var("USER", "carla");

        let dir = tempdir().unwrap();
        let toml_str = format!(
            "source_root = {:?}\ndest_host = \"h\"\ndest_folder = \"/d\"\n",
            dir.path()
        );
        let config: BatchConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.username, "carla");
    }
}
