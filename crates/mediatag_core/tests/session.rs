//! Whole sessions over videos with stand-in analysis tools and ffmpeg.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use mediatag_core::config::Settings;
use mediatag_core::logging::{LogConfig, RunLogger};
use mediatag_core::models::{
    CaptureDate, Location, MediaItem, ProjectAssignment, SpeakerNameMap, TagSet,
    TranscriptSegment,
};
use mediatag_core::orchestrator::{AnalysisOptions, ToolPaths};
use mediatag_core::process::CancelToken;
use mediatag_core::session::{
    AcceptAll, ReviewHandler, SessionEvent, SessionOutcome, TaggingRequest, TaggingSession,
};
use tempfile::TempDir;

const FACE_SCRIPT: &str = r#"
case "$1" in
  *broken.mp4) echo "no frames" >&2; exit 1 ;;
esac
echo "PROGRESS:50"
echo 'RESULTS:{"names":["Ada"],"detections":[{"time":1.0,"name":"Ada"}]}'
"#;

const SPEECH_SCRIPT: &str = r#"
echo "PROGRESS:100"
echo 'RESULTS:{"segments":[{"start":0.5,"end":2.0,"text":"Hello","speaker":"SPEAKER_00"},{"start":5.0,"end":6.0,"text":"Bye","speaker":"SPEAKER_01"}]}'
"#;

/// Copies input to output and records its arguments beside the input.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
in=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then in="$arg"; fi
  prev="$arg"
  out="$arg"
done
printf '%s\n' "$@" > "$in.args"
cp "$in" "$out"
"#;

struct Setup {
    dir: TempDir,
    session: TaggingSession,
}

fn setup() -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let res = dir.path().join("res");
    std::fs::create_dir(&res).unwrap();
    let write = |name: &str, body: &str| -> PathBuf {
        let p = res.join(name);
        std::fs::write(&p, body).unwrap();
        p
    };
    let ffmpeg = write("ffmpeg", FAKE_FFMPEG);
    std::fs::set_permissions(&ffmpeg, std::fs::Permissions::from_mode(0o755)).unwrap();

    let tools = ToolPaths {
        python: Some(PathBuf::from("/bin/sh")),
        ffmpeg: Some(ffmpeg),
        ffprobe: Some(PathBuf::from("/bin/true")),
        face_script: write("face.sh", FACE_SCRIPT),
        face_index: write("faces.index", ""),
        names_database: write("names.json", "{}"),
        speech_script: write("speech.sh", SPEECH_SCRIPT),
        access_token: "token".into(),
    };
    let options = AnalysisOptions {
        poll_interval: Duration::from_millis(20),
        ..AnalysisOptions::default()
    };
    let logger = Arc::new(RunLogger::detached("session", LogConfig::default(), None));
    let session = TaggingSession::new(Settings::default(), logger)
        .with_tools(tools)
        .with_options(options);
    Setup { dir, session }
}

fn video(dir: &Path, name: &str) -> MediaItem {
    let p = dir.join(name);
    std::fs::write(&p, format!("frames of {}", name)).unwrap();
    MediaItem::from_path(p).unwrap()
}

fn request(items: Vec<MediaItem>) -> TaggingRequest {
    let mut tags = TagSet::new();
    tags.add_input("promo");
    let mut req = TaggingRequest::new(items, tags, CaptureDate::new(2022, 9, 3).unwrap());
    req.location = Some(Location::new("Theatre", "51.5", "-0.12"));
    req.transcribe = true;
    req
}

fn args_of(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(format!("{}.args", name)))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn videos_are_tagged_with_people_and_transcripts() {
    let Setup { dir, session } = setup();
    let req = request(vec![video(dir.path(), "clip.mp4")]);
    let (tx, rx) = mpsc::channel();

    let outcome = session
        .run(&req, &mut AcceptAll, &CancelToken::new(), &tx)
        .unwrap();
    let SessionOutcome::Completed(summary) = outcome else {
        panic!("session was cancelled");
    };
    assert!(!summary.has_failures());

    let staged = dir.path().join("tagged_clip.mp4");
    assert_eq!(std::fs::read(&staged).unwrap(), b"frames of clip.mp4");
    assert!(args_of(dir.path(), "clip.mp4")
        .contains(&"description=Tags: promo - People: Ada".to_string()));

    let sidecar = dir.path().join("tagged_clip.txt");
    assert_eq!(summary.sidecars, vec![sidecar.clone()]);
    assert_eq!(
        std::fs::read_to_string(sidecar).unwrap(),
        "Location: Theatre\n\n\
         [00:00:00.50-00:00:02.00] Ada: Hello\n\
         [00:00:05.00-00:00:06.00] SPEAKER_01: Bye\n"
    );

    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::Analysis(_))));
}

#[test]
fn failed_analysis_still_embeds_tags() {
    let Setup { dir, session } = setup();
    let req = request(vec![
        video(dir.path(), "broken.mp4"),
        video(dir.path(), "fine.mp4"),
    ]);
    let (tx, rx) = mpsc::channel();

    let SessionOutcome::Completed(summary) = session
        .run(&req, &mut AcceptAll, &CancelToken::new(), &tx)
        .unwrap()
    else {
        panic!("session was cancelled");
    };

    assert_eq!(summary.analysis_failures.len(), 1);
    assert_eq!(summary.analysis_failures[0].file, dir.path().join("broken.mp4"));
    assert_eq!(summary.placed_count(), 2);
    assert!(args_of(dir.path(), "broken.mp4")
        .contains(&"description=Tags: promo - People: ".to_string()));
    assert!(!dir.path().join("tagged_broken.txt").exists());
    assert!(dir.path().join("tagged_fine.txt").exists());

    assert!(rx.try_iter().any(|e| matches!(
        e,
        SessionEvent::ItemFailed { ref file, .. } if file.ends_with("broken.mp4")
    )));
}

/// Renames everyone and drops the people list.
struct Renamer;

impl ReviewHandler for Renamer {
    fn review_people(&mut self, _item: &MediaItem, _people: Vec<String>) -> Vec<String> {
        vec!["Grace".into()]
    }

    fn review_transcript(
        &mut self,
        _item: &MediaItem,
        names: &mut SpeakerNameMap,
        segments: &mut Vec<TranscriptSegment>,
    ) {
        names.rename("SPEAKER_01", "Lin");
        segments.retain(|s| s.speaker != "SPEAKER_00");
    }
}

#[test]
fn review_edits_reach_metadata_and_sidecar() {
    let Setup { dir, session } = setup();
    let req = request(vec![video(dir.path(), "talk.mov")]);
    let (tx, _rx) = mpsc::channel();

    let outcome = session
        .run(&req, &mut Renamer, &CancelToken::new(), &tx)
        .unwrap();
    assert!(!outcome.is_cancelled());

    assert!(args_of(dir.path(), "talk.mov")
        .contains(&"description=Tags: promo - People: Grace".to_string()));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("tagged_talk.txt")).unwrap(),
        "Location: Theatre\n\n[00:00:05.00-00:00:06.00] Lin: Bye\n"
    );
}

#[test]
fn local_transcripts_name_the_project() {
    let Setup { dir, session } = setup();
    let mut req = request(vec![video(dir.path(), "speech.mp4")]);
    req.projects = ProjectAssignment::with_default("Fall Gala");
    let (tx, _rx) = mpsc::channel();

    let outcome = session
        .run(&req, &mut AcceptAll, &CancelToken::new(), &tx)
        .unwrap();
    assert!(!outcome.is_cancelled());

    let text = std::fs::read_to_string(dir.path().join("tagged_speech.txt")).unwrap();
    assert!(
        text.starts_with("Project: Fall Gala\nLocation: Theatre\n\n"),
        "{}",
        text
    );
}
