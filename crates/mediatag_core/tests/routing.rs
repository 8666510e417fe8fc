//! Destination routing against a local directory standing in for the share.

use std::io::Write;
use std::path::{Path, PathBuf};

use mediatag_core::embed::TempTaggedFile;
use mediatag_core::models::{CaptureDate, CopyMode, ProjectAssignment};
use mediatag_core::routing::{DestinationRouter, MountHelper, NetworkLayout, RouteTarget};
use tempfile::TempDir;

fn layout(mount: &Path) -> NetworkLayout {
    NetworkLayout {
        mount_path: mount.to_path_buf(),
        finished_library: PathBuf::from("Library/Finished"),
        broll_root: PathBuf::from("Library/BRoll"),
        stringouts_folder: "Stringouts".into(),
    }
}

fn tagged(dir: &Path, name: &str, body: &[u8]) -> TempTaggedFile {
    let original = dir.join(name);
    std::fs::write(&original, b"original").unwrap();
    let (temp, mut file) = TempTaggedFile::create_for(&original).unwrap();
    file.write_all(body).unwrap();
    temp
}

fn date() -> CaptureDate {
    CaptureDate::new(2023, 6, 14).unwrap()
}

fn network(mode: CopyMode, projects: ProjectAssignment) -> RouteTarget {
    RouteTarget::Network {
        mode,
        date: date(),
        projects,
    }
}

fn leftover_temps(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("temp_"))
        .count()
}

#[cfg(unix)]
#[test]
fn unreachable_share_falls_back_to_local_staging() {
    let work = TempDir::new().unwrap();
    let script = work.path().join("mount.sh");
    std::fs::write(&script, "exit 1\n").unwrap();
    let mount = work.path().join("share");
    let router = DestinationRouter::new(
        layout(&mount),
        MountHelper::new(&mount, Some(script)),
        false,
    );

    let files = vec![
        tagged(work.path(), "a.jpg", b"tagged a"),
        tagged(work.path(), "b.mov", b"tagged b"),
    ];
    let report = router.route(
        files,
        &network(CopyMode::Finished, ProjectAssignment::new()),
        |_| {},
    );

    assert!(report.used_fallback);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.failures.is_empty());
    assert_eq!(
        std::fs::read(work.path().join("tagged_a.jpg")).unwrap(),
        b"tagged a"
    );
    assert_eq!(
        std::fs::read(work.path().join("tagged_b.mov")).unwrap(),
        b"tagged b"
    );
    assert_eq!(std::fs::read(work.path().join("a.jpg")).unwrap(), b"original");
    assert!(!mount.exists());
    assert_eq!(leftover_temps(work.path()), 0);
}

#[test]
fn finished_copies_land_in_year_folder() {
    let work = TempDir::new().unwrap();
    let share = TempDir::new().unwrap();
    let router = DestinationRouter::new(
        layout(share.path()),
        MountHelper::new(share.path(), None),
        false,
    );

    let files = vec![
        tagged(work.path(), "a.jpg", b"aaaa"),
        tagged(work.path(), "b.mov", b"bbbbbbbb"),
    ];
    let mut last = (0, 0);
    let report = router.route(
        files,
        &network(CopyMode::Finished, ProjectAssignment::new()),
        |p| last = (p.copied_bytes, p.total_bytes),
    );

    let year_dir = share.path().join("Library/Finished/2023");
    assert!(!report.used_fallback);
    assert_eq!(report.placed.len(), 2);
    assert_eq!(std::fs::read(year_dir.join("a.jpg")).unwrap(), b"aaaa");
    assert_eq!(std::fs::read(year_dir.join("b.mov")).unwrap(), b"bbbbbbbb");
    assert_eq!(
        report.destination_of(&work.path().join("b.mov")),
        Some(&year_dir.join("b.mov"))
    );
    assert_eq!(last, (12, 12));
    assert_eq!(leftover_temps(work.path()), 0);
    assert!(!work.path().join("tagged_a.jpg").exists());
}

#[test]
fn broll_copies_use_project_stringout_folder() {
    let work = TempDir::new().unwrap();
    let share = TempDir::new().unwrap();
    let router = DestinationRouter::new(
        layout(share.path()),
        MountHelper::new(share.path(), None),
        false,
    );

    let report = router.route(
        vec![tagged(work.path(), "clip.mp4", b"clip")],
        &network(
            CopyMode::BRoll,
            ProjectAssignment::with_default("Summer Gala"),
        ),
        |_| {},
    );

    let dest = share
        .path()
        .join("Library/BRoll/2023/Stringouts/2023_06_Summer_Gala/clip.mp4");
    assert!(report.failures.is_empty());
    assert_eq!(std::fs::read(dest).unwrap(), b"clip");
}
