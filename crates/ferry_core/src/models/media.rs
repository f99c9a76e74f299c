//! Media asset data structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::{BitDepth, SubtitleCodec};

/// A discovered video file, immutable once probed.
///
/// Carries the detection results the pipeline decides on: bit depth for
/// the encoder path and the first subtitle stream's codec (if any) for
/// the extraction branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Absolute (or caller-relative) path to the source file.
    pub source_path: PathBuf,
    /// Path relative to the scan root; mirrored under temp and remote roots.
    pub relative_path: PathBuf,
    /// Detected video bit depth.
    #[serde(default)]
    pub bit_depth: BitDepth,
    /// Codec of the first subtitle stream, if one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_codec: Option<SubtitleCodec>,
}

impl VideoAsset {
    /// Create an unprobed asset.
    pub fn new(source_path: impl Into<PathBuf>, relative_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            relative_path: relative_path.into(),
            bit_depth: BitDepth::Unknown,
            subtitle_codec: None,
        }
    }

    /// Relative stem: the relative path with its extension removed.
    ///
    /// `a/b.mp4` becomes `a/b`; output artifacts append `.mkv` / `.srt`.
    pub fn relative_stem(&self) -> PathBuf {
        let parent = self.relative_path.parent().unwrap_or_else(|| Path::new(""));
        let stem = self
            .relative_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        parent.join(stem)
    }

    /// Local output path under the temp root with the given extension.
    ///
    /// Appends the extension to the full stem, so a dotted name like
    /// `movie.part1.mp4` maps to `movie.part1.mkv`.
    pub fn temp_artifact_path(&self, temp_root: &Path, extension: &str) -> PathBuf {
        let stem = self.relative_stem();
        let file_name = stem
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        let parent = stem.parent().unwrap_or_else(|| Path::new(""));
        temp_root
            .join(parent)
            .join(format!("{}.{}", file_name, extension))
    }

    /// Remote path under the destination folder with the given extension.
    ///
    /// Built with forward slashes regardless of the local platform, since
    /// it addresses a POSIX remote.
    pub fn remote_artifact_path(&self, dest_folder: &str, extension: &str) -> String {
        let stem = self.relative_stem();
        let mut parts: Vec<String> = Vec::new();
        for comp in stem.components() {
            parts.push(comp.as_os_str().to_string_lossy().to_string());
        }
        format!(
            "{}/{}.{}",
            dest_folder.trim_end_matches('/'),
            parts.join("/"),
            extension
        )
    }

    /// Display name used in logs and the batch summary.
    pub fn display_name(&self) -> String {
        self.relative_path.to_string_lossy().to_string()
    }

    /// Whether a subtitle stream was detected during probing.
    pub fn has_subtitles(&self) -> bool {
        self.subtitle_codec.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_stem_drops_extension() {
        let asset = VideoAsset::new("/videos/a/b.mp4", "a/b.mp4");
        assert_eq!(asset.relative_stem(), PathBuf::from("a/b"));
    }

    #[test]
    fn relative_stem_for_top_level_file() {
        let asset = VideoAsset::new("/videos/movie.avi", "movie.avi");
        assert_eq!(asset.relative_stem(), PathBuf::from("movie"));
    }

    #[test]
    fn temp_artifact_mirrors_structure() {
        let asset = VideoAsset::new("/videos/a/b.mp4", "a/b.mp4");
        assert_eq!(
            asset.temp_artifact_path(Path::new("/tmp/x"), "mkv"),
            PathBuf::from("/tmp/x/a/b.mkv")
        );
        assert_eq!(
            asset.temp_artifact_path(Path::new("/tmp/x"), "srt"),
            PathBuf::from("/tmp/x/a/b.srt")
        );
    }

    #[test]
    fn dotted_names_keep_their_inner_dots() {
        let asset = VideoAsset::new("/videos/movie.part1.mp4", "movie.part1.mp4");
        assert_eq!(
            asset.temp_artifact_path(Path::new("/tmp/x"), "mkv"),
            PathBuf::from("/tmp/x/movie.part1.mkv")
        );
        assert_eq!(
            asset.remote_artifact_path("/d", "mkv"),
            "/d/movie.part1.mkv"
        );
    }

    #[test]
    fn remote_artifact_uses_forward_slashes() {
        let asset = VideoAsset::new("/videos/a/b.mp4", "a/b.mp4");
        assert_eq!(asset.remote_artifact_path("/d", "mkv"), "/d/a/b.mkv");
        assert_eq!(asset.remote_artifact_path("/d/", "srt"), "/d/a/b.srt");
    }
}
