//! Events and results of a tagging session.

use std::path::PathBuf;

use crate::orchestrator::ProgressUpdate;
use crate::routing::{CopyProgress, RoutingReport};

/// Messages sent from the worker while a session runs.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new phase started (analysis, embedding, routing...).
    Phase(String),
    Analysis(ProgressUpdate),
    /// `index` of `count` files have been embedded (1-based).
    Embedded {
        index: usize,
        count: usize,
        file_name: String,
    },
    Copy(CopyProgress),
    Warning(String),
    /// One item failed; the batch goes on.
    ItemFailed { file: PathBuf, message: String },
}

/// An item-scoped failure kept for the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub file: PathBuf,
    pub message: String,
}

/// Everything a completed session produced.
#[derive(Debug, Default)]
pub struct SessionSummary {
    /// Videos whose analysis failed (still embedded with tags only).
    pub analysis_failures: Vec<ItemFailure>,
    pub embed_failures: Vec<ItemFailure>,
    pub routing: RoutingReport,
    pub sidecars: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl SessionSummary {
    pub fn placed_count(&self) -> usize {
        self.routing.placed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.analysis_failures.is_empty()
            || !self.embed_failures.is_empty()
            || !self.routing.failures.is_empty()
    }
}

#[derive(Debug)]
pub enum SessionOutcome {
    Completed(SessionSummary),
    /// Cancelled by the user; every temp file was removed.
    Cancelled,
}

impl SessionOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionOutcome::Cancelled)
    }
}
