//! Video transcoding with hardware/software fallback.
//!
//! Target is always H.264 video + 192k AAC audio in an MKV container.
//! Hardware-preferred jobs try NVENC first and fall back to libx264 on any
//! failure; software-only jobs go straight to libx264. 10-bit sources get
//! a pixel-format downconversion before NVENC, which cannot consume them.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{BitDepth, EncodeMode, TranscodeJob};
use crate::runner::{CommandRunner, RunnerError};

/// Errors from transcoding. Only surfaced after every eligible encoder
/// path has been exhausted.
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Source file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to create output directory {path}: {source}")]
    OutputDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{encoder} failed with exit code {exit_code}: {message}")]
    EncodeFailed {
        encoder: String,
        exit_code: i32,
        message: String,
    },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Result type for transcode operations.
pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// A produced MKV artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkvArtifact {
    /// Path of the output file.
    pub path: PathBuf,
    /// Which encoder produced it ("h264_nvenc" or "libx264").
    pub encoder: String,
}

/// Transcodes assets to H.264+AAC MKV via ffmpeg.
#[derive(Debug, Clone)]
pub struct VideoTranscoder {
    runner: CommandRunner,
    ffmpeg: String,
}

impl VideoTranscoder {
    pub fn new(runner: CommandRunner) -> Self {
        Self {
            runner,
            ffmpeg: "ffmpeg".to_string(),
        }
    }

    /// Use a specific ffmpeg binary instead of whatever PATH resolves.
    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    /// Transcode one asset according to its job description.
    ///
    /// Hardware-preferred mode attempts NVENC and absorbs its failure by
    /// falling through to software; software failure is fatal for the
    /// asset and carries the encoder's stderr tail.
    pub fn transcode(&self, job: &TranscodeJob) -> TranscodeResult<MkvArtifact> {
        let input = &job.asset.source_path;
        if !input.exists() {
            return Err(TranscodeError::FileNotFound(input.display().to_string()));
        }

        if let Some(parent) = job.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| TranscodeError::OutputDirFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        if job.mode == EncodeMode::HardwarePreferred {
            match self.run_encode(&self.hardware_args(job), "h264_nvenc") {
                Ok(()) => {
                    tracing::info!("GPU encoding completed for {}", input.display());
                    return Ok(MkvArtifact {
                        path: job.output_path.clone(),
                        encoder: "h264_nvenc".to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "GPU encoding failed for {}, falling back to CPU: {}",
                        input.display(),
                        e
                    );
                }
            }
        }

        self.run_encode(&self.software_args(job), "libx264")?;
        tracing::info!("CPU encoding completed for {}", input.display());

        Ok(MkvArtifact {
            path: job.output_path.clone(),
            encoder: "libx264".to_string(),
        })
    }

    /// NVENC argument vector. 10-bit sources are downconverted to 8-bit
    /// 4:2:0 before the encoder sees them.
    fn hardware_args(&self, job: &TranscodeJob) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.asset.source_path.display().to_string(),
        ];

        if job.asset.bit_depth == BitDepth::Ten {
            tracing::info!("Converting 10-bit content for NVENC compatibility");
            args.push("-pix_fmt".to_string());
            args.push("yuv420p".to_string());
        }

        args.extend(
            [
                "-c:v",
                "h264_nvenc",
                "-preset",
                "p4",
                "-profile:v",
                "high",
                "-b:v",
                job.bitrate.as_str(),
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "-map",
                "0:v",
                "-map",
                "0:a",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(job.output_path.display().to_string());
        args
    }

    /// libx264 argument vector: CRF 22 with the target bitrate as a cap.
    fn software_args(&self, job: &TranscodeJob) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.asset.source_path.display().to_string(),
        ];
        args.extend(
            [
                "-c:v", "libx264", "-preset", "medium", "-crf", "22", "-b:v",
                job.bitrate.as_str(),
                "-c:a", "aac", "-b:a", "192k", "-map", "0:v", "-map", "0:a",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(job.output_path.display().to_string());
        args
    }

    fn run_encode(&self, args: &[String], encoder: &str) -> TranscodeResult<()> {
        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let output = self.runner.run(&self.ffmpeg, &arg_refs)?;

        if !output.success() {
            return Err(TranscodeError::EncodeFailed {
                encoder: encoder.to_string(),
                exit_code: output.exit_code,
                message: output.stderr_tail(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoAsset;
    use std::time::Duration;

    fn job(bit_depth: BitDepth, mode: EncodeMode) -> TranscodeJob {
        let mut asset = VideoAsset::new("/videos/a/b.mp4", "a/b.mp4");
        asset.bit_depth = bit_depth;
        TranscodeJob::new(asset, "2M", mode, PathBuf::from("/tmp/x/a/b.mkv"))
    }

    fn transcoder() -> VideoTranscoder {
        VideoTranscoder::new(CommandRunner::new(Duration::from_secs(5)))
    }

    #[test]
    fn hardware_args_downconvert_10bit() {
        let args = transcoder().hardware_args(&job(BitDepth::Ten, EncodeMode::HardwarePreferred));
        let pix = args.iter().position(|a| a == "-pix_fmt").unwrap();
        let nvenc = args.iter().position(|a| a == "h264_nvenc").unwrap();
        assert_eq!(args[pix + 1], "yuv420p");
        assert!(pix < nvenc, "downconversion must precede the encoder args");
    }

    #[test]
    fn hardware_args_leave_8bit_alone() {
        let args = transcoder().hardware_args(&job(BitDepth::Eight, EncodeMode::HardwarePreferred));
        assert!(!args.contains(&"-pix_fmt".to_string()));
        assert!(args.contains(&"h264_nvenc".to_string()));
        assert!(args.contains(&"p4".to_string()));
    }

    #[test]
    fn software_args_use_crf_with_bitrate_cap() {
        let args = transcoder().software_args(&job(BitDepth::Eight, EncodeMode::SoftwareOnly));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"22".to_string()));
        assert!(args.contains(&"2M".to_string()));
        assert!(!args.contains(&"h264_nvenc".to_string()));
    }

    #[test]
    fn both_paths_reencode_audio_to_aac() {
        for args in [
            transcoder().hardware_args(&job(BitDepth::Eight, EncodeMode::HardwarePreferred)),
            transcoder().software_args(&job(BitDepth::Eight, EncodeMode::SoftwareOnly)),
        ] {
            let a = args.iter().position(|x| x == "-c:a").unwrap();
            assert_eq!(args[a + 1], "aac");
            assert!(args.contains(&"192k".to_string()));
        }
    }

    #[test]
    fn missing_source_is_fatal() {
        let result = transcoder().transcode(&job(BitDepth::Eight, EncodeMode::SoftwareOnly));
        assert!(matches!(result, Err(TranscodeError::FileNotFound(_))));
    }

    /// Fake encoder that rejects NVENC invocations, accepts libx264 ones,
    /// and logs every call so the fallback order can be asserted.
    fn write_fake_ffmpeg(dir: &Path, call_log: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> \"{log}\"\n\
             case \"$*\" in *h264_nvenc*) exit 1 ;; esac\n\
             for last; do :; done\n\
             : > \"$last\"\n\
             exit 0\n",
            log = call_log.display()
        );
        let path = dir.join("ffmpeg");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn hardware_failure_falls_back_to_software() {
        let dir = tempfile::tempdir().unwrap();
        let call_log = dir.path().join("calls.log");
        let fake = write_fake_ffmpeg(dir.path(), &call_log);

        let input = dir.path().join("in.mp4");
        fs::write(&input, b"x").unwrap();
        let output = dir.path().join("out/in.mkv");

        let mut asset = VideoAsset::new(&input, "in.mp4");
        asset.bit_depth = BitDepth::Eight;
        let job = TranscodeJob::new(
            asset,
            "2M",
            EncodeMode::HardwarePreferred,
            output.clone(),
        );

        let transcoder = VideoTranscoder::new(CommandRunner::new(Duration::from_secs(10)))
            .with_ffmpeg(fake.display().to_string());
        let artifact = transcoder.transcode(&job).unwrap();

        assert_eq!(artifact.encoder, "libx264");
        assert!(output.is_file());

        let calls = fs::read_to_string(&call_log).unwrap();
        let invocations: Vec<&str> = calls.lines().collect();
        assert_eq!(invocations.len(), 2, "one NVENC attempt, one fallback");
        assert!(invocations[0].contains("h264_nvenc"));
        assert!(invocations[1].contains("libx264"));
    }

    #[test]
    fn software_only_never_invokes_the_hardware_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let call_log = dir.path().join("calls.log");
        let fake = write_fake_ffmpeg(dir.path(), &call_log);

        let input = dir.path().join("in.mp4");
        fs::write(&input, b"x").unwrap();

        let mut asset = VideoAsset::new(&input, "in.mp4");
        asset.bit_depth = BitDepth::Eight;
        let job = TranscodeJob::new(
            asset,
            "2M",
            EncodeMode::SoftwareOnly,
            dir.path().join("out/in.mkv"),
        );

        let transcoder = VideoTranscoder::new(CommandRunner::new(Duration::from_secs(10)))
            .with_ffmpeg(fake.display().to_string());
        transcoder.transcode(&job).unwrap();

        let calls = fs::read_to_string(&call_log).unwrap();
        assert_eq!(calls.lines().count(), 1);
        assert!(!calls.contains("h264_nvenc"));
    }
}
