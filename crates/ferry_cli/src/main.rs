//! mkvferry - batch transcode videos to H.264+AAC MKV and push them to
//! a remote host.
//!
//! Usage:
//!   mkvferry <SOURCE> <DEST_HOST> <DEST_FOLDER> --username ferry
//!   mkvferry --config batch.toml

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferry_core::config::BatchConfig;
use ferry_core::models::{BatchSummary, EncodeMode, TransferMethod, VideoAsset};
use ferry_core::orchestrator::{BatchRunner, ProgressCallback};

#[derive(Parser, Debug)]
#[command(
    name = "mkvferry",
    version,
    about = "Transcode videos to H.264+AAC MKV and transfer to a remote host"
)]
struct Cli {
    /// Source folder containing videos
    #[arg(required_unless_present = "config")]
    source: Option<PathBuf>,

    /// Destination host for file transfer
    #[arg(required_unless_present = "config")]
    dest_host: Option<String>,

    /// Destination folder on the remote host
    #[arg(required_unless_present = "config")]
    dest_folder: Option<String>,

    /// Video bitrate (default: 2M)
    #[arg(long)]
    bitrate: Option<String>,

    /// Username for the remote host (default: the local login user)
    #[arg(long)]
    username: Option<String>,

    /// Password for the remote host (key auth is tried when omitted)
    #[arg(long)]
    password: Option<String>,

    /// Transfer method (default: sftp)
    #[arg(long, value_name = "sftp|scp")]
    method: Option<TransferMethod>,

    /// Temp directory for transcoded files (default: /tmp/transcode)
    #[arg(long)]
    temp: Option<PathBuf>,

    /// Directory for per-asset log files (default: .logs)
    #[arg(long)]
    logs: Option<PathBuf>,

    /// Try the GPU encoder first, falling back to CPU on failure
    #[arg(long)]
    gpu: bool,

    /// Load settings from a TOML file instead of positional arguments
    /// (command-line flags still override)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the batch summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,
}

impl Cli {
    /// Fold CLI arguments into a batch config, honoring `--config` as
    /// the base layer.
    fn into_config(self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => BatchConfig {
                source_root: self.source.clone().unwrap_or_default(),
                dest_host: self.dest_host.clone().unwrap_or_default(),
                dest_folder: self.dest_folder.clone().unwrap_or_default(),
                bitrate: "2M".to_string(),
                encode_mode: EncodeMode::default(),
                username: String::new(),
                password: None,
                transfer_method: TransferMethod::default(),
                temp_root: PathBuf::from("/tmp/transcode"),
                logs_folder: PathBuf::from(".logs"),
                tool_timeout_secs: 4 * 60 * 60,
            },
        };

        if let Some(source) = self.source {
            config.source_root = source;
        }
        if let Some(host) = self.dest_host {
            config.dest_host = host;
        }
        if let Some(folder) = self.dest_folder {
            config.dest_folder = folder;
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate = bitrate;
        }
        if let Some(username) = self.username {
            config.username = username;
        } else if config.username.is_empty() {
            // Same default as plain scp: connect as the local login user.
            if let Some(user) = ferry_core::config::local_username() {
                config.username = user;
            }
        }
        if let Some(password) = self.password {
            config.password = Some(password);
        }
        if let Some(method) = self.method {
            config.transfer_method = method;
        }
        if let Some(temp) = self.temp {
            config.temp_root = temp;
        }
        if let Some(logs) = self.logs {
            config.logs_folder = logs;
        }
        if self.gpu {
            config.encode_mode = EncodeMode::HardwarePreferred;
        }

        Ok(config)
    }
}

fn progress_printer(asset: &VideoAsset) -> Option<ProgressCallback> {
    let name = asset.display_name();
    Some(Box::new(move |step, percent, message| {
        println!("  [{:>3}%] {} - {}: {}", percent, name, step, message);
    }))
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("=== Batch summary ===");
    for result in &summary.assets {
        let status = if result.succeeded() { "OK  " } else { "FAIL" };
        println!("  [{}] {}", status, result.asset);
        if let Some(error) = &result.error {
            println!("         {}", error);
        }
        for transfer in &result.transfers {
            if !transfer.succeeded {
                let detail = transfer.error.as_deref().unwrap_or("unknown error");
                println!("         transfer {}: {}", transfer.remote_path, detail);
            }
        }
    }
    println!(
        "{} succeeded, {} failed",
        summary.succeeded_count(),
        summary.failed_count()
    );
}

fn run(cli: Cli) -> Result<bool> {
    let summary_json = cli.summary_json.clone();
    let config = cli.into_config()?;

    println!("Source: {}", config.source_root.display());
    println!("Bitrate: {}", config.bitrate);
    println!("Destination: {}:{}", config.dest_host, config.dest_folder);
    println!("Transfer method: {}", config.transfer_method);
    println!("Temp directory: {}", config.temp_root.display());
    println!("Encoder: {}", config.encode_mode);

    let runner = BatchRunner::new(config);
    tracing::info!("mkvferry {} starting batch", ferry_core::version());
    let summary = runner
        .run(progress_printer, None)
        .context("batch run failed")?;

    print_summary(&summary);

    if let Some(path) = summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    Ok(summary.all_succeeded())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_args_build_a_config() {
        let cli = Cli::parse_from([
            "mkvferry",
            "/videos",
            "media-host",
            "/srv/media",
            "--username",
            "ferry",
            "--gpu",
        ]);
        let config = cli.into_config().unwrap();

        assert_eq!(config.source_root, PathBuf::from("/videos"));
        assert_eq!(config.dest_host, "media-host");
        assert_eq!(config.dest_folder, "/srv/media");
        assert_eq!(config.username, "ferry");
        assert_eq!(config.bitrate, "2M");
        assert_eq!(config.encode_mode, EncodeMode::HardwarePreferred);
        assert_eq!(config.transfer_method, TransferMethod::Sftp);
    }

    #[test]
    fn method_flag_selects_scp() {
        let cli = Cli::parse_from([
            "mkvferry",
            "/videos",
            "media-host",
            "/srv/media",
            "--method",
            "scp",
        ]);
        let config = cli.into_config().unwrap();

        assert_eq!(config.transfer_method, TransferMethod::Scp);
    }

    #[test]
    fn source_is_required_without_config() {
        assert!(Cli::try_parse_from(["mkvferry"]).is_err());
    }

    #[test]
    fn omitted_username_falls_back_to_local_user() {
        std::env::set_var("USER", "dana");

        let cli = Cli::parse_from(["mkvferry", "/videos", "media-host", "/srv/media"]);
        let config = cli.into_config().unwrap();

        assert_eq!(config.username, "dana");
    }
}
