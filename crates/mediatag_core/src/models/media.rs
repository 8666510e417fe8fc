//! Media items selected for tagging.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of media file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Photo extensions handled by the EXIF path.
    pub const PHOTO_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg"];

    /// Video extensions handled by the remux path.
    pub const VIDEO_EXTENSIONS: &'static [&'static str] = &["mp4", "mov", "m4v"];

    /// Detect the media kind from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if Self::PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Photo)
        } else if Self::VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A single photo or video chosen by the user.
///
/// Immutable once created; the original file is never modified through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    path: PathBuf,
    kind: MediaKind,
}

impl MediaItem {
    /// Create an item from a path, or `None` if the extension is unsupported.
    ///
    /// Relative paths are made absolute against the current directory.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = MediaKind::from_path(&path)?;
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&path))
                .unwrap_or(path)
        };
        Some(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// File name for display and destination naming.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Directory containing the original file.
    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_case_insensitively() {
        assert_eq!(
            MediaKind::from_path(Path::new("/a/IMG_001.JPG")),
            Some(MediaKind::Photo)
        );
        assert_eq!(
            MediaKind::from_path(Path::new("/a/clip.Mp4")),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_path(Path::new("/a/notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("/a/no_extension")), None);
    }

    #[test]
    fn relative_paths_become_absolute() {
        let item = MediaItem::from_path("clip.mov").unwrap();
        assert!(item.path().is_absolute());
        assert!(item.is_video());
        assert_eq!(item.file_name(), "clip.mov");
    }
}
