//! Routing errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::embed::EmbedError;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// B-roll routing needs a project name for every file.
    #[error("No project name assigned to {file}")]
    MissingProject { file: String },

    #[error("Could not place {file}: {source}")]
    Placement {
        file: String,
        #[source]
        source: EmbedError,
    },

    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    #[error("Destination {path} is not a directory")]
    NotADirectory { path: PathBuf },
}

impl RoutingError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

pub type RoutingResult<T> = Result<T, RoutingError>;
