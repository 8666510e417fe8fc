//! Errors raised while launching or supervising subprocesses.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// I/O failure while supervising a running process.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A required tool was not found anywhere.
    #[error("Could not find '{tool}' (searched: {})", display_paths(.searched))]
    ToolNotFound { tool: String, searched: Vec<PathBuf> },
}

impl ProcessError {
    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn tool_not_found(tool: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        Self::ToolNotFound {
            tool: tool.into(),
            searched,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "PATH".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ProcessResult<T> = Result<T, ProcessError>;
