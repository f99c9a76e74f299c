//! Ferry Core - Backend logic for the mkvferry transcode-and-transfer
//! pipeline.
//!
//! This crate contains all business logic with no CLI dependencies:
//! asset discovery, ffprobe inspection, ffmpeg transcoding, subtitle
//! extraction, and SFTP/SCP transfer, coordinated by the orchestrator.

pub mod config;
pub mod discovery;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod runner;
pub mod subtitles;
pub mod transcode;
pub mod transfer;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
