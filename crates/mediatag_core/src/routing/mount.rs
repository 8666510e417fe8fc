//! Network share availability and the mount helper.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::process::run_captured;

/// Result of making sure the share is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    /// The mount path existed already.
    Present,
    /// The path appeared after running the helper.
    Mounted,
    Unavailable,
}

impl MountStatus {
    pub fn is_available(&self) -> bool {
        !matches!(self, MountStatus::Unavailable)
    }
}

/// Checks the mount path and runs the helper script at most once per call.
#[derive(Debug, Clone)]
pub struct MountHelper {
    mount_path: PathBuf,
    script: Option<PathBuf>,
}

impl MountHelper {
    /// `script` is `None` when mounting must not be attempted.
    pub fn new(mount_path: impl Into<PathBuf>, script: Option<PathBuf>) -> Self {
        Self {
            mount_path: mount_path.into(),
            script,
        }
    }

    pub fn mount_path(&self) -> &Path {
        &self.mount_path
    }

    /// The helper's exit code is ignored; only the path check counts.
    pub fn ensure_mounted(&self) -> MountStatus {
        if self.mount_path.is_dir() {
            return MountStatus::Present;
        }
        let Some(ref script) = self.script else {
            tracing::info!("{} not mounted, mount attempt disabled", self.mount_path.display());
            return MountStatus::Unavailable;
        };

        tracing::info!(
            "{} not mounted, running {}",
            self.mount_path.display(),
            script.display()
        );
        let mut cmd = Command::new("bash");
        cmd.arg(script);
        match run_captured(cmd) {
            Ok(output) => tracing::debug!(
                "Mount helper exited with {}: {}",
                output.code,
                output.stderr.trim()
            ),
            Err(e) => tracing::warn!("Mount helper could not run: {}", e),
        }

        if self.mount_path.is_dir() {
            MountStatus::Mounted
        } else {
            MountStatus::Unavailable
        }
    }
}
