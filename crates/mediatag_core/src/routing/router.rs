//! Final placement of tagged files.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::embed::TempTaggedFile;
use crate::models::{CaptureDate, CopyMode, ProjectAssignment};

use super::copier::{BatchCopier, CopyProgress};
use super::destination::{staged_path, NetworkLayout};
use super::errors::{RoutingError, RoutingResult};
use super::mount::{MountHelper, MountStatus};

/// Where the batch should end up.
#[derive(Debug, Clone)]
pub enum RouteTarget {
    /// Keep tagged copies beside the originals.
    Local,
    /// Copy to the network share.
    Network {
        mode: CopyMode,
        date: CaptureDate,
        projects: ProjectAssignment,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedFile {
    pub original: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug)]
pub struct RoutingFailure {
    pub original: PathBuf,
    pub error: RoutingError,
}

/// What happened to every file handed to the router.
#[derive(Debug, Default)]
pub struct RoutingReport {
    pub placed: Vec<RoutedFile>,
    pub failures: Vec<RoutingFailure>,
    pub warnings: Vec<String>,
    /// The share was requested but unreachable.
    pub used_fallback: bool,
}

impl RoutingReport {
    pub fn destination_of(&self, original: &Path) -> Option<&PathBuf> {
        self.placed
            .iter()
            .find(|r| r.original == original)
            .map(|r| &r.destination)
    }
}

/// Decides final paths and owns deletion of every temp file it receives.
#[derive(Debug, Clone)]
pub struct DestinationRouter {
    layout: NetworkLayout,
    mount: MountHelper,
    replace_original: bool,
}

impl DestinationRouter {
    pub fn new(layout: NetworkLayout, mount: MountHelper, replace_original: bool) -> Self {
        Self {
            layout,
            mount,
            replace_original,
        }
    }

    pub fn from_settings(settings: &Settings, allow_mount: bool) -> Self {
        let network = &settings.network;
        let layout = NetworkLayout::from_settings(network);
        let script = (allow_mount && network.attempt_mount)
            .then(|| settings.resource_path(&network.mount_script));
        let mount = MountHelper::new(layout.mount_path.clone(), script);
        Self::new(layout, mount, settings.embedding.replace_original)
    }

    pub fn layout(&self) -> &NetworkLayout {
        &self.layout
    }

    /// Place every file. Temp files not persisted are deleted on return.
    /// Where `original` lands on the share for `mode`.
    fn network_destination(
        &self,
        original: &Path,
        mode: CopyMode,
        date: CaptureDate,
        projects: &ProjectAssignment,
    ) -> RoutingResult<PathBuf> {
        let name = original.file_name().ok_or_else(|| RoutingError::NoFileName {
            path: original.to_path_buf(),
        })?;
        let dir = match mode {
            CopyMode::Finished => self.layout.finished_dir(date),
            CopyMode::BRoll => match projects.project_for(original) {
                Some(project) => self.layout.broll_dir(date, project),
                None => {
                    return Err(RoutingError::MissingProject {
                        file: original.display().to_string(),
                    })
                }
            },
        };
        Ok(dir.join(name))
    }

    pub fn route<F: FnMut(&CopyProgress)>(
        &self,
        files: Vec<TempTaggedFile>,
        target: &RouteTarget,
        on_progress: F,
    ) -> RoutingReport {
        let mut report = RoutingReport::default();
        if files.is_empty() {
            return report;
        }

        match target {
            RouteTarget::Local => self.place_locally(files, &mut report),
            RouteTarget::Network {
                mode,
                date,
                projects,
            } => {
                if self.mount.ensure_mounted() == MountStatus::Unavailable {
                    let warning = format!(
                        "Network share {} is unavailable; tagged files were kept locally",
                        self.mount.mount_path().display()
                    );
                    tracing::warn!("{}", warning);
                    report.warnings.push(warning);
                    report.used_fallback = true;
                    self.place_locally(files, &mut report);
                } else {
                    self.copy_to_share(files, *mode, *date, projects, on_progress, &mut report);
                }
            }
        }

        tracing::info!(
            "Routing finished: {} placed, {} failed",
            report.placed.len(),
            report.failures.len()
        );
        report
    }

    fn place_locally(&self, files: Vec<TempTaggedFile>, report: &mut RoutingReport) {
        for temp in files {
            let original = temp.original().to_path_buf();
            let dest = if self.replace_original {
                original.clone()
            } else {
                staged_path(&original)
            };
            match temp.persist(&dest) {
                Ok(destination) => {
                    tracing::debug!("Placed {}", destination.display());
                    report.placed.push(RoutedFile {
                        original,
                        destination,
                    });
                }
                Err(e) => report.failures.push(RoutingFailure {
                    error: RoutingError::Placement {
                        file: original.display().to_string(),
                        source: e,
                    },
                    original,
                }),
            }
        }
    }

    fn copy_to_share<F: FnMut(&CopyProgress)>(
        &self,
        files: Vec<TempTaggedFile>,
        mode: CopyMode,
        date: CaptureDate,
        projects: &ProjectAssignment,
        on_progress: F,
        report: &mut RoutingReport,
    ) {
        let mut planned = Vec::with_capacity(files.len());
        for temp in files {
            let original = temp.original().to_path_buf();
            match self.network_destination(&original, mode, date, projects) {
                Ok(dest) => planned.push((temp, original, dest)),
                Err(error) => report.failures.push(RoutingFailure { original, error }),
            }
        }

        let total: u64 = planned.iter().map(|(t, _, _)| t.len()).sum();
        let mut copier = BatchCopier::new(total, on_progress);

        for (temp, original, dest) in planned {
            match copier.copy(temp.path(), &dest) {
                Ok(bytes) => {
                    tracing::debug!("Copied {} bytes to {}", bytes, dest.display());
                    report.placed.push(RoutedFile {
                        original,
                        destination: dest,
                    });
                }
                Err(error) => {
                    tracing::warn!("Copy of {} failed: {}", original.display(), error);
                    report.failures.push(RoutingFailure { original, error });
                }
            }
            // Temp deleted here whether or not the copy worked
            drop(temp);
        }
    }
}
