//! Error types for the analysis pipeline.
//!
//! Errors carry context that chains through layers:
//! Batch → Video → Stage → Detail

use std::io;

use thiserror::Error;

use crate::process::ProcessError;
use crate::protocol::ProtocolError;

/// Batch-level pipeline error.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage failed for one video. Recorded per video; the batch continues.
    #[error("Video '{video}' failed at stage '{stage}': {source}")]
    StageFailed {
        video: String,
        stage: String,
        #[source]
        source: StageError,
    },

    /// Inputs rejected before anything ran.
    #[error("Batch failed validation: {message}")]
    ValidationFailed { message: String },

    /// Tools or resources missing before anything ran.
    #[error("Batch setup failed: {message}")]
    SetupFailed { message: String },
}

impl PipelineError {
    pub fn stage_failed(
        video: impl Into<String>,
        stage: impl Into<String>,
        source: StageError,
    ) -> Self {
        Self::StageFailed {
            video: video.into(),
            stage: stage.into(),
            source,
        }
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    pub fn setup_failed(message: impl Into<String>) -> Self {
        Self::SetupFailed {
            message: message.into(),
        }
    }

    /// Name of the stage that failed, for stage failures.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Error from one analysis stage.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// The stage subprocess exited non-zero; `message` is its stderr.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    #[error("Required tool not available: {0}")]
    ToolMissing(String),

    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl StageError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    pub fn tool_missing(message: impl Into<String>) -> Self {
        Self::ToolMissing(message.into())
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }
}

pub type StageResult<T> = Result<T, StageError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_displays_context() {
        let err = StageError::command_failed("Face", 2, "model not found");
        let msg = err.to_string();
        assert!(msg.contains("Face"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("model not found"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let stage_err = StageError::file_not_found("/media/clip.mp4");
        let err = PipelineError::stage_failed("clip.mp4", "Speech", stage_err);
        let msg = err.to_string();
        assert!(msg.contains("clip.mp4"));
        assert!(msg.contains("Speech"));
        assert_eq!(err.stage(), Some("Speech"));
    }
}
