//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Video bit depth detected by probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    /// Probe failed or reported nothing usable.
    #[default]
    Unknown,
    /// 8-bit samples.
    Eight,
    /// 10-bit samples (needs downconversion before NVENC).
    Ten,
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitDepth::Unknown => write!(f, "unknown"),
            BitDepth::Eight => write!(f, "8-bit"),
            BitDepth::Ten => write!(f, "10-bit"),
        }
    }
}

/// Family of a detected subtitle codec.
///
/// Determines the extraction path: text codecs convert straight to SRT,
/// style codecs (ASS/SSA) go through a native-format intermediate, and
/// image codecs need OCR and are best-effort only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFamily {
    Text,
    Style,
    Image,
}

impl std::fmt::Display for SubtitleFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFamily::Text => write!(f, "text"),
            SubtitleFamily::Style => write!(f, "style"),
            SubtitleFamily::Image => write!(f, "image"),
        }
    }
}

/// A subtitle codec as reported by ffprobe, classified into its family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCodec {
    /// Raw codec name from ffprobe (e.g. "subrip", "ass", "hdmv_pgs_subtitle").
    pub name: String,
    /// Extraction family.
    pub family: SubtitleFamily,
}

impl SubtitleCodec {
    /// Classify an ffprobe codec name into a subtitle codec.
    ///
    /// Unrecognized names fall into the text family and get the standard
    /// one-step SRT conversion, matching ffmpeg's own default handling.
    pub fn from_codec_name(name: &str) -> Self {
        let family = match name {
            "ass" | "ssa" => SubtitleFamily::Style,
            "dvd_subtitle" | "dvdsub" | "hdmv_pgs_subtitle" | "pgssub" => SubtitleFamily::Image,
            _ => SubtitleFamily::Text,
        };
        Self {
            name: name.to_string(),
            family,
        }
    }
}

impl std::fmt::Display for SubtitleCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.family)
    }
}

/// Encoder selection policy for a transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    /// Try the hardware encoder first, fall back to software on failure.
    HardwarePreferred,
    /// Software encode only; the hardware path is never attempted.
    #[default]
    SoftwareOnly,
}

impl std::fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeMode::HardwarePreferred => write!(f, "hardware-preferred"),
            EncodeMode::SoftwareOnly => write!(f, "software-only"),
        }
    }
}

/// Preferred protocol for remote transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMethod {
    /// Authenticated file-copy session (libssh2 SFTP), SCP shell fallback.
    #[default]
    Sftp,
    /// Shell-invoked ssh/scp only.
    Scp,
}

impl std::fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferMethod::Sftp => write!(f, "sftp"),
            TransferMethod::Scp => write!(f, "scp"),
        }
    }
}

impl std::str::FromStr for TransferMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sftp" => Ok(TransferMethod::Sftp),
            "scp" => Ok(TransferMethod::Scp),
            other => Err(format!("unknown transfer method '{}'", other)),
        }
    }
}
