//! Metadata embedding engine.
//!
//! Photos get a lossless EXIF rewrite, videos a stream-copy remux with new
//! container metadata. Either way the result is a [`TempTaggedFile`] beside
//! the original; the original itself is never opened for writing.

mod errors;
mod image;
mod temp;
mod video;

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset};
use filetime::FileTime;

use crate::models::{CaptureDate, Location, MediaItem, MediaKind};

pub use errors::{EmbedError, EmbedResult};
pub use image::{embed_photo, exif_payload, read_description, rewrite_exif, strip_exif, ExifUpdate};
pub use temp::TempTaggedFile;
pub use video::{embed_video, RemuxOptionsBuilder};

/// Everything written into one file.
#[derive(Debug, Clone)]
pub struct EmbedMetadata {
    /// Composed `Tags: ... - People: ...` text.
    pub description: String,
    pub date: CaptureDate,
    pub location: Option<Location>,
    /// Offset used for the local-time creation date in videos.
    pub utc_offset: FixedOffset,
}

impl EmbedMetadata {
    pub fn new(
        description: impl Into<String>,
        date: CaptureDate,
        location: Option<Location>,
    ) -> Self {
        Self {
            description: description.into(),
            date,
            location,
            utc_offset: utc(),
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(utc);
        self
    }
}

fn utc() -> FixedOffset {
    chrono::Utc.fix()
}

/// Set access and modification times to the capture date at UTC midnight.
///
/// On macOS an mtime older than the birth time also moves the birth time.
pub(crate) fn set_capture_time(path: &Path, date: CaptureDate) -> EmbedResult<()> {
    let time = FileTime::from_unix_time(date.instant().timestamp(), 0);
    filetime::set_file_times(path, time, time)
        .map_err(|e| EmbedError::io(format!("setting file times on {}", path.display()), e))
}

/// Dispatches each item to the photo or video path.
#[derive(Debug, Clone, Default)]
pub struct MetadataEmbedder {
    ffmpeg: Option<PathBuf>,
}

impl MetadataEmbedder {
    pub fn new(ffmpeg: Option<PathBuf>) -> Self {
        Self { ffmpeg }
    }

    /// Produce a tagged temp copy of `item`.
    pub fn embed(&self, item: &MediaItem, meta: &EmbedMetadata) -> EmbedResult<TempTaggedFile> {
        match item.kind() {
            MediaKind::Photo => embed_photo(item, meta),
            MediaKind::Video => {
                let ffmpeg = self
                    .ffmpeg
                    .as_deref()
                    .ok_or_else(|| EmbedError::ToolMissing("ffmpeg".to_string()))?;
                embed_video(item, meta, ffmpeg)
            }
        }
    }
}
