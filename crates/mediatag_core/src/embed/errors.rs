//! Errors raised while embedding metadata.

use std::io;

use thiserror::Error;

use crate::models::ModelError;
use crate::process::ProcessError;

/// Embedding failure for a single item. The original file is untouched.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported file '{path}': {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("EXIF error: {0}")]
    Exif(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(#[from] ModelError),

    /// The remux tool exited non-zero; `stderr` is its captured output.
    #[error("Remux failed with exit code {exit_code}: {stderr}")]
    RemuxFailed { exit_code: i32, stderr: String },

    #[error("Required tool not available: {0}")]
    ToolMissing(String),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl EmbedError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<exif::Error> for EmbedError {
    fn from(e: exif::Error) -> Self {
        Self::Exif(e.to_string())
    }
}

pub type EmbedResult<T> = Result<T, EmbedError>;
