//! Pipeline step implementations.
//!
//! Each step handles one phase of the transcode-and-transfer pipeline.

mod cleanup;
mod probe;
mod subtitles;
mod transcode;
mod transfer;

pub use cleanup::CleanupStep;
pub use probe::ProbeStep;
pub use subtitles::SubtitlesStep;
pub use transcode::TranscodeStep;
pub use transfer::TransferStep;
