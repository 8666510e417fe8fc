//! Plain-text transcript files written next to routed videos.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::{SpeakerNameMap, TranscriptSegment};

/// Optional header lines at the top of a transcript file.
#[derive(Debug, Clone, Default)]
pub struct SidecarHeader {
    pub project: Option<String>,
    pub location: Option<String>,
}

/// `HH:MM:SS.ff` (hundredths of a second).
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 100.0).round() as u64
    } else {
        0
    };
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        total / 360_000,
        (total / 6_000) % 60,
        (total / 100) % 60,
        total % 100
    )
}

/// Render the transcript, one line per segment, speakers resolved through `names`.
pub fn render_transcript(
    segments: &[TranscriptSegment],
    names: &SpeakerNameMap,
    header: &SidecarHeader,
) -> String {
    let mut out = String::new();
    if let Some(ref project) = header.project {
        let _ = writeln!(out, "Project: {}", project);
    }
    if let Some(ref location) = header.location {
        let _ = writeln!(out, "Location: {}", location);
    }
    if header.project.is_some() || header.location.is_some() {
        out.push('\n');
    }

    for seg in segments {
        let _ = writeln!(
            out,
            "[{}-{}] {}: {}",
            format_timestamp(seg.start),
            format_timestamp(seg.end),
            names.display_name(&seg.speaker),
            seg.text
        );
    }
    out
}

/// `<stem>.txt` beside the video.
pub fn sidecar_path(video: &Path) -> PathBuf {
    video.with_extension("txt")
}

/// Write the transcript next to `video`, returning the file's path.
pub fn write_sidecar(video: &Path, contents: &str) -> io::Result<PathBuf> {
    let path = sidecar_path(video);
    std::fs::write(&path, contents)?;
    tracing::debug!("Wrote transcript {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, speaker: &str, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: text.into(),
            speaker: speaker.into(),
        }
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00:00.00");
        assert_eq!(format_timestamp(3725.456), "01:02:05.46");
        assert_eq!(format_timestamp(-4.0), "00:00:00.00");
    }

    #[test]
    fn renders_header_and_named_speakers() {
        let mut names = SpeakerNameMap::new();
        names.insert_if_absent("SPEAKER_00", "Ada");
        let header = SidecarHeader {
            project: Some("Gala".into()),
            location: None,
        };
        let text = render_transcript(
            &[
                seg(1.0, 2.5, "SPEAKER_00", "Hello"),
                seg(3.0, 4.0, "speaker1", "Hi"),
            ],
            &names,
            &header,
        );
        assert_eq!(
            text,
            "Project: Gala\n\n[00:00:01.00-00:00:02.50] Ada: Hello\n[00:00:03.00-00:00:04.00] speaker1: Hi\n"
        );
    }

    #[test]
    fn sidecar_sits_beside_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mov");
        let path = write_sidecar(&video, "x\n").unwrap();
        assert_eq!(path, dir.path().join("clip.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x\n");
    }
}
