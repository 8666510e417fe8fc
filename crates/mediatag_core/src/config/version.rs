//! Last-seen version marker for the one-time "what's new" notice.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Single-line file recording the last version the user was shown.
#[derive(Debug, Clone)]
pub struct VersionMarker {
    path: PathBuf,
}

impl VersionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Version stored in the marker, if any.
    pub fn last_seen(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let line = content.lines().next()?.trim();
        (!line.is_empty()).then(|| line.to_string())
    }

    /// True when `current` differs from the stored version (or none is stored).
    pub fn should_show_notice(&self, current: &str) -> bool {
        self.last_seen().as_deref() != Some(current.trim())
    }

    /// Store `current` as seen.
    pub fn record(&self, current: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", current.trim()))
    }
}
