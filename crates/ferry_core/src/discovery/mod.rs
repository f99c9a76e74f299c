//! Asset discovery from the source root.
//!
//! Recursively scans the source directory for files whose extension is in
//! the fixed allow-list and builds `VideoAsset`s carrying their
//! root-relative paths. Results are sorted so batch runs are reproducible.

use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use crate::models::VideoAsset;

/// Extensions recognized as video files (lowercase, without the dot).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "ts",
];

/// Errors from asset discovery.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Source root is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to walk source tree: {0}")]
    WalkFailed(#[from] walkdir::Error),
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Whether a path carries a recognized video extension (case-insensitive).
fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Discover video assets under the source root.
///
/// Returns unprobed assets sorted by relative path.
pub fn discover_assets(source_root: &Path) -> DiscoveryResult<Vec<VideoAsset>> {
    if !source_root.is_dir() {
        return Err(DiscoveryError::NotADirectory(
            source_root.display().to_string(),
        ));
    }

    let mut assets = Vec::new();

    for entry in WalkDir::new(source_root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_video_file(path) {
            continue;
        }

        // strip_prefix cannot fail for entries produced by this walk
        let relative = path
            .strip_prefix(source_root)
            .unwrap_or(path)
            .to_path_buf();

        assets.push(VideoAsset::new(path.to_path_buf(), relative));
    }

    assets.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    tracing::info!(
        "Discovered {} video files under {}",
        assets.len(),
        source_root.display()
    );

    Ok(assets)
}
