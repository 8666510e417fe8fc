//! Scoped temporary output files.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::errors::{EmbedError, EmbedResult};

/// A tagged copy of one media file, living next to the original.
///
/// Named `temp_<stem>_<random>.<ext>` in the original's directory so
/// the final rename stays on one filesystem. The file is deleted when
/// the handle is dropped unless it was persisted.
#[derive(Debug)]
pub struct TempTaggedFile {
    path: TempPath,
    original: PathBuf,
}

impl TempTaggedFile {
    /// Create an empty temp file beside `original`, returning the handle
    /// and an open writer.
    pub fn create_for(original: &Path) -> EmbedResult<(Self, File)> {
        let dir = original.parent().unwrap_or_else(|| Path::new("."));
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let suffix = original
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let named = tempfile::Builder::new()
            .prefix(&format!("temp_{}_", stem))
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| EmbedError::io(format!("creating temp file in {}", dir.display()), e))?;

        let (file, path) = named.into_parts();
        Ok((
            Self {
                path,
                original: original.to_path_buf(),
            },
            file,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file this copy was made from.
    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn len(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically rename the temp file to `dest` (same filesystem only).
    ///
    /// On failure the temp file is still removed.
    pub fn persist(self, dest: &Path) -> EmbedResult<PathBuf> {
        self.path
            .persist(dest)
            .map_err(|e| {
                EmbedError::io(format!("moving tagged file to {}", dest.display()), e.error)
            })?;
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn temp_lives_beside_original_and_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("IMG_0001.jpg");

        let (temp, mut file) = TempTaggedFile::create_for(&original).unwrap();
        file.write_all(b"data").unwrap();
        let path = temp.path().to_path_buf();

        assert_eq!(path.parent(), Some(dir.path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("temp_IMG_0001_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(temp.len(), 4);

        drop(file);
        drop(temp);
        assert!(!path.exists());
    }

    #[test]
    fn persist_renames() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("clip.mp4");
        let (temp, mut file) = TempTaggedFile::create_for(&original).unwrap();
        file.write_all(b"movie").unwrap();
        drop(file);

        let dest = dir.path().join("tagged_clip.mp4");
        let temp_path = temp.path().to_path_buf();
        temp.persist(&dest).unwrap();

        assert!(!temp_path.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"movie");
    }
}
