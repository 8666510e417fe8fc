//! Session-level errors. Only these halt a batch.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ModelError;
use crate::orchestrator::PipelineError;

/// Request rejected before any subprocess or embedding work.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No media files selected")]
    NoItems,

    #[error("Selected file does not exist: {0}")]
    MissingItem(PathBuf),

    #[error("At least one tag is required")]
    NoTags,

    #[error("A location is required")]
    MissingLocation,

    #[error("Invalid location: {0}")]
    InvalidLocation(ModelError),

    #[error("B-roll copy needs a project name for {0}")]
    MissingProject(PathBuf),

    #[error("Transcription requires an access token")]
    MissingAccessToken,

    #[error("Required tool not found: {0}")]
    ToolMissing(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Analysis could not start (tools or resources missing).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub type SessionResult<T> = Result<T, SessionError>;
