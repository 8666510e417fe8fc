//! Container metadata for videos via a lossless ffmpeg remux.
//!
//! All streams are copied as-is; existing container metadata is cleared
//! and replaced with the description, creation time and optional
//! location, each written under both the generic key and the QuickTime
//! key so Apple tools pick them up.

use std::path::Path;
use std::process::Command;

use crate::models::MediaItem;
use crate::process::run_captured;

use super::errors::{EmbedError, EmbedResult};
use super::temp::TempTaggedFile;
use super::{set_capture_time, EmbedMetadata};

/// Builder for ffmpeg remux command-line tokens.
pub struct RemuxOptionsBuilder<'a> {
    meta: &'a EmbedMetadata,
    input: &'a Path,
    output: &'a Path,
}

impl<'a> RemuxOptionsBuilder<'a> {
    pub fn new(meta: &'a EmbedMetadata, input: &'a Path, output: &'a Path) -> Self {
        Self {
            meta,
            input,
            output,
        }
    }

    /// Build the complete argument list (without the program name).
    pub fn build(&self) -> EmbedResult<Vec<String>> {
        let mut tokens: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        tokens.push(self.input.to_string_lossy().to_string());

        // Copy every stream untouched, drop all inherited metadata
        for t in ["-map", "0", "-c", "copy", "-map_metadata", "-1"] {
            tokens.push(t.to_string());
        }
        // Needed for custom keys in mp4/mov
        tokens.push("-movflags".to_string());
        tokens.push("use_metadata_tags".to_string());

        self.add_metadata(&mut tokens)?;

        tokens.push(self.output.to_string_lossy().to_string());
        Ok(tokens)
    }

    fn add_metadata(&self, tokens: &mut Vec<String>) -> EmbedResult<()> {
        let mut push = |key: &str, value: &str| {
            tokens.push("-metadata".to_string());
            tokens.push(format!("{}={}", key, value));
        };

        let description = &self.meta.description;
        push("description", description);
        push("com.apple.quicktime.description", description);

        push("creation_time", &self.meta.date.iso_utc());
        push(
            "com.apple.quicktime.creationdate",
            &self.meta.date.iso_with_offset(self.meta.utc_offset),
        );

        if let Some(ref location) = self.meta.location {
            let iso = location.iso6709()?;
            push("location", &iso);
            push("com.apple.quicktime.location.ISO6709", &iso);
        }
        Ok(())
    }
}

/// Remux a tagged copy of a video next to the original.
pub fn embed_video(
    item: &MediaItem,
    meta: &EmbedMetadata,
    ffmpeg: &Path,
) -> EmbedResult<TempTaggedFile> {
    let input = item.path();
    if !input.is_file() {
        return Err(EmbedError::io(
            format!("opening {}", input.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }

    // ffmpeg overwrites the empty placeholder (-y)
    let (temp, file) = TempTaggedFile::create_for(input)?;
    drop(file);

    let args = RemuxOptionsBuilder::new(meta, input, temp.path()).build()?;
    let mut cmd = Command::new(ffmpeg);
    cmd.args(&args);

    let output = run_captured(cmd)?;
    if !output.success() {
        tracing::warn!(
            "Remux of {} failed with exit code {}",
            input.display(),
            output.code
        );
        return Err(EmbedError::RemuxFailed {
            exit_code: output.code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    set_capture_time(temp.path(), meta.date)?;
    tracing::debug!("Tagged video {} -> {}", input.display(), temp.path().display());
    Ok(temp)
}
