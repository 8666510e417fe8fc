//! Destination routing choices.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Network-share routing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    /// Finished footage, routed into the library by year.
    Finished,
    /// Supplementary footage, routed into a per-project stringout folder.
    #[serde(rename = "broll")]
    BRoll,
}

impl CopyMode {
    pub fn requires_project(&self) -> bool {
        matches!(self, CopyMode::BRoll)
    }
}

impl std::fmt::Display for CopyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyMode::Finished => write!(f, "finished"),
            CopyMode::BRoll => write!(f, "broll"),
        }
    }
}

impl std::str::FromStr for CopyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "finished" | "xgrid" => Ok(CopyMode::Finished),
            "broll" | "b-roll" => Ok(CopyMode::BRoll),
            other => Err(format!("Unknown copy mode '{}'", other)),
        }
    }
}

/// Project names per item, with an optional batch-wide default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    default: Option<String>,
    per_item: HashMap<PathBuf, String>,
}

impl ProjectAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `name` for every item without its own assignment.
    pub fn with_default(name: impl Into<String>) -> Self {
        let mut assignment = Self::default();
        assignment.set_default(name);
        assignment
    }

    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default = non_blank(name.into());
    }

    pub fn assign(&mut self, item: impl Into<PathBuf>, name: impl Into<String>) {
        let item = item.into();
        match non_blank(name.into()) {
            Some(name) => {
                self.per_item.insert(item, name);
            }
            None => {
                self.per_item.remove(&item);
            }
        }
    }

    /// Project name for an item, falling back to the default.
    pub fn project_for(&self, item: &Path) -> Option<&str> {
        self.per_item
            .get(item)
            .or(self.default.as_ref())
            .map(String::as_str)
    }
}

fn non_blank(name: String) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
