//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Asset → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::transcode::TranscodeError;

/// Top-level pipeline error with asset context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Asset '{asset}' failed at step '{step_name}': {source}")]
    StepFailed {
        asset: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the asset run (create directories, open log).
    #[error("Asset '{asset}' setup failed: {message}")]
    SetupFailed { asset: String, message: String },

    /// Pipeline was cancelled.
    #[error("Asset '{asset}' was cancelled")]
    Cancelled { asset: String },
}

impl PipelineError {
    pub fn step_failed(
        asset: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            asset: asset.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(asset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            asset: asset.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(asset: impl Into<String>) -> Self {
        Self::Cancelled {
            asset: asset.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// Transcoding exhausted every eligible encoder.
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::invalid_input("source missing");
        let pipeline_err = PipelineError::step_failed("a/b.mp4", "Probe", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("a/b.mp4"));
        assert!(msg.contains("Probe"));
    }

    #[test]
    fn transcode_error_passes_through() {
        let err: StepError = TranscodeError::FileNotFound("/x.mp4".to_string()).into();
        assert!(err.to_string().contains("/x.mp4"));
    }
}
