//! Per-asset log files.
//!
//! Each asset gets its own log file under the configured logs folder,
//! capturing phase markers, warnings, and stage results for that asset's
//! run. Library modules additionally emit `tracing` events; this file log
//! is the user-facing per-asset record.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

/// Per-asset logger writing timestamped lines to a dedicated file.
pub struct AssetLogger {
    asset_name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    warning_count: Mutex<u32>,
}

impl AssetLogger {
    /// Create a logger for one asset; the log file is named after the
    /// asset's relative path (sanitized).
    pub fn new(asset_name: impl Into<String>, log_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let asset_name = asset_name.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&asset_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            asset_name,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            warning_count: Mutex::new(0),
        })
    }

    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn info(&self, message: &str) {
        self.write_line(message);
    }

    pub fn warn(&self, message: &str) {
        *self.warning_count.lock() += 1;
        self.write_line(&format!("[WARNING] {}", message));
        tracing::warn!("{}: {}", self.asset_name, message);
    }

    pub fn error(&self, message: &str) {
        self.write_line(&format!("[ERROR] {}", message));
        tracing::error!("{}: {}", self.asset_name, message);
    }

    /// Stage boundary marker.
    pub fn phase(&self, phase_name: &str) {
        self.write_line(&format!("--- {} ---", phase_name));
    }

    pub fn success(&self, message: &str) {
        self.write_line(&format!("[OK] {}", message));
    }

    /// Number of warnings recorded so far.
    pub fn warning_count(&self) -> u32 {
        *self.warning_count.lock()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    fn write_line(&self, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "[{}] {}", timestamp, message);
        }
    }
}

impl Drop for AssetLogger {
    fn drop(&mut self) {
        self.flush();
        *self.file_writer.lock() = None;
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_log_file() {
        let dir = tempdir().unwrap();
        let logger = AssetLogger::new("a/b.mp4", dir.path()).unwrap();

        assert!(logger.log_path().exists());
        assert!(logger.log_path().to_string_lossy().contains("a_b.mp4.log"));
    }

    #[test]
    fn writes_phases_and_warnings() {
        let dir = tempdir().unwrap();
        let logger = AssetLogger::new("clip.mkv", dir.path()).unwrap();

        logger.phase("Transcode");
        logger.warn("GPU encode failed");
        logger.success("fell back to CPU");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("--- Transcode ---"));
        assert!(content.contains("[WARNING] GPU encode failed"));
        assert!(content.contains("[OK] fell back to CPU"));
        assert_eq!(logger.warning_count(), 1);
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
