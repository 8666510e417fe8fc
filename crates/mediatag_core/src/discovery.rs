//! Expansion of user-selected files and folders into media items.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::models::MediaItem;

/// Media found under the selected paths.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Supported files in selection order; folders expand sorted by name.
    pub items: Vec<MediaItem>,
    /// Selected paths that don't exist.
    pub missing: Vec<PathBuf>,
    /// Explicitly selected files with an unsupported extension.
    pub unsupported: Vec<PathBuf>,
}

/// Files this tool writes itself, or OS metadata droppings.
fn is_skipped_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.') || n.starts_with("tagged_") || n.starts_with("temp_"))
        .unwrap_or(true)
}

/// Expand `paths` recursively. Duplicates keep their first position.
pub fn collect_media(paths: &[PathBuf]) -> Discovered {
    let mut found = Discovered::default();
    let mut seen = HashSet::new();

    let mut push = |found: &mut Discovered, item: MediaItem| {
        if seen.insert(item.path().to_path_buf()) {
            found.items.push(item);
        }
    };

    for path in paths {
        if path.is_file() {
            match MediaItem::from_path(path) {
                Some(item) => push(&mut found, item),
                None => found.unsupported.push(path.clone()),
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || is_skipped_name(entry.path()) {
                    continue;
                }
                if let Some(item) = MediaItem::from_path(entry.path()) {
                    push(&mut found, item);
                }
            }
        } else {
            found.missing.push(path.clone());
        }
    }

    tracing::debug!(
        "Discovered {} media file(s), {} missing path(s)",
        found.items.len(),
        found.missing.len()
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn expands_folders_sorted_and_dedupes() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("day2");
        std::fs::create_dir(&sub).unwrap();
        for name in ["b.JPG", "a.mov", "notes.txt", ".hidden.jpg", "tagged_a.mov"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::write(sub.join("c.mp4"), b"x").unwrap();

        let explicit = dir.path().join("b.JPG");
        let found = collect_media(&[explicit.clone(), dir.path().to_path_buf()]);

        let names: Vec<String> = found.items.iter().map(|i| i.file_name()).collect();
        assert_eq!(names, vec!["b.JPG", "a.mov", "c.mp4"]);
        assert!(found.missing.is_empty());
    }

    #[test]
    fn reports_missing_and_unsupported() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("readme.txt");
        std::fs::write(&txt, b"x").unwrap();
        let gone = dir.path().join("gone.jpg");

        let found = collect_media(&[txt.clone(), gone.clone()]);
        assert!(found.items.is_empty());
        assert_eq!(found.unsupported, vec![txt]);
        assert_eq!(found.missing, vec![gone]);
    }
}
