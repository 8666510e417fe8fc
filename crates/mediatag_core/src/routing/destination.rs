//! Destination directory layout on the network share.

use std::path::{Path, PathBuf};

use crate::config::{expand_home, NetworkSettings};
use crate::models::CaptureDate;

/// Folder layout on the share. Library roots may be absolute or relative
/// to the mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLayout {
    pub mount_path: PathBuf,
    pub finished_library: PathBuf,
    pub broll_root: PathBuf,
    pub stringouts_folder: String,
}

impl NetworkLayout {
    pub fn from_settings(network: &NetworkSettings) -> Self {
        Self {
            mount_path: expand_home(&network.mount_path),
            finished_library: PathBuf::from(&network.finished_library),
            broll_root: PathBuf::from(&network.broll_root),
            stringouts_folder: network.stringouts_folder.clone(),
        }
    }

    fn under_mount(&self, path: &Path) -> PathBuf {
        self.mount_path.join(path)
    }

    /// `<library>/<year>/`
    pub fn finished_dir(&self, date: CaptureDate) -> PathBuf {
        self.under_mount(&self.finished_library)
            .join(date.year().to_string())
    }

    /// `<broll>/<year>/<stringouts>/<year>_<MM>_<Project_Name>/`
    pub fn broll_dir(&self, date: CaptureDate, project: &str) -> PathBuf {
        self.under_mount(&self.broll_root)
            .join(date.year().to_string())
            .join(&self.stringouts_folder)
            .join(project_folder_name(date, project))
    }
}

/// `<year>_<MM>_<project>` with spaces and path separators replaced by
/// underscores, so the result is always a single path component.
pub fn project_folder_name(date: CaptureDate, project: &str) -> String {
    let project: String = project
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}_{:02}_{}", date.year(), date.month(), project)
}

/// Local staging name for a tagged copy: `tagged_<name>` beside the original.
pub fn staged_path(original: &Path) -> PathBuf {
    let name = original
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    original.with_file_name(format!("tagged_{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> NetworkLayout {
        NetworkLayout {
            mount_path: PathBuf::from("/Volumes/Share"),
            finished_library: PathBuf::from("Library"),
            broll_root: PathBuf::from("/Volumes/Share/Production/BROLL"),
            stringouts_folder: "Project_Stringouts".into(),
        }
    }

    #[test]
    fn finished_goes_under_year() {
        let date = CaptureDate::new(2024, 2, 29).unwrap();
        assert_eq!(
            layout().finished_dir(date),
            PathBuf::from("/Volumes/Share/Library/2024")
        );
    }

    #[test]
    fn broll_folder_uses_month_and_project() {
        let date = CaptureDate::new(2023, 6, 1).unwrap();
        assert_eq!(
            layout().broll_dir(date, "Summer Camp Promo"),
            PathBuf::from(
                "/Volumes/Share/Production/BROLL/2023/Project_Stringouts/2023_06_Summer_Camp_Promo"
            )
        );
    }

    #[test]
    fn project_names_cannot_leave_stringouts_folder() {
        let date = CaptureDate::new(2023, 6, 1).unwrap();
        assert_eq!(project_folder_name(date, "../../etc"), "2023_06_.._.._etc");
        assert_eq!(project_folder_name(date, r"a\b: c"), "2023_06_a_b__c");

        let stringouts = PathBuf::from("/Volumes/Share/Production/BROLL/2023/Project_Stringouts");
        let dir = layout().broll_dir(date, "/x/../y");
        assert_eq!(dir.parent(), Some(stringouts.as_path()));
    }

    #[test]
    fn staged_name_is_prefixed() {
        assert_eq!(
            staged_path(Path::new("/shoot/IMG_4.JPG")),
            PathBuf::from("/shoot/tagged_IMG_4.JPG")
        );
    }
}
