//! Data models for mkvferry.
//!
//! This module contains all core data structures used throughout the pipeline:
//! - Enums for bit depth, subtitle families, encode mode, transfer method
//! - Media structures (VideoAsset)
//! - Job structures (transcode, subtitle, transfer)
//! - Result aggregates (per-asset results, batch summary)

mod enums;
mod jobs;
mod media;
mod results;

// Re-export all public types
pub use enums::{BitDepth, EncodeMode, SubtitleCodec, SubtitleFamily, TransferMethod};
pub use jobs::{Credentials, SubtitleJob, TranscodeJob, TransferTask};
pub use media::VideoAsset;
pub use results::{AssetResult, BatchSummary, TransferOutcome};
