//! Speaker-face reconciliation.
//!
//! Diarization yields anonymous speaker ids; face recognition yields
//! timestamped names. A speaker's first segment decides its name: if
//! exactly one distinct face is detected inside that segment's window
//! the speaker takes that name, otherwise it keeps its raw id.

use crate::models::{Detection, SpeakerNameMap, TranscriptSegment};

/// Map each speaker id in `segments` to a display name.
///
/// Windows are inclusive (`start <= t <= end`). The mapping is a
/// first-write-wins cache: later segments of an already mapped speaker
/// are never looked at.
pub fn reconcile_speakers(
    segments: &[TranscriptSegment],
    detections: &[Detection],
) -> SpeakerNameMap {
    let mut map = SpeakerNameMap::new();

    for seg in segments {
        if map.contains(&seg.speaker) {
            continue;
        }

        let mut names: Vec<&str> = Vec::new();
        for det in detections.iter().filter(|d| seg.contains(d.time)) {
            let name = det.name.trim();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }

        let name = match names.as_slice() {
            [only] => {
                tracing::debug!("Speaker {} identified as {}", seg.speaker, only);
                only.to_string()
            }
            [] => seg.speaker.clone(),
            many => {
                tracing::debug!(
                    "Speaker {} is ambiguous ({}), keeping id",
                    seg.speaker,
                    many.join(", ")
                );
                seg.speaker.clone()
            }
        };
        map.insert_if_absent(&seg.speaker, name);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, speaker: &str) -> TranscriptSegment {
        TranscriptSegment {
            start,
            end,
            text: "words".into(),
            speaker: speaker.into(),
        }
    }

    #[test]
    fn single_face_names_speaker() {
        let detections = vec![Detection::new(5.0, "A"), Detection::new(6.0, "A")];
        let map = reconcile_speakers(&[seg(4.0, 7.0, "s0")], &detections);
        assert_eq!(map.get("s0"), Some("A"));
    }

    #[test]
    fn two_faces_are_ambiguous() {
        let detections = vec![Detection::new(5.0, "A"), Detection::new(5.0, "B")];
        let map = reconcile_speakers(&[seg(4.0, 7.0, "s0")], &detections);
        assert_eq!(map.get("s0"), Some("s0"));
    }

    #[test]
    fn first_decision_wins() {
        let detections = vec![
            Detection::new(1.0, "A"),
            Detection::new(11.0, "B"),
            Detection::new(21.0, "C"),
            Detection::new(21.5, "D"),
        ];
        let segments = vec![
            seg(0.0, 2.0, "s0"),
            seg(10.0, 12.0, "s0"),
            seg(20.0, 22.0, "s1"),
            seg(10.0, 12.0, "s1"),
        ];
        let map = reconcile_speakers(&segments, &detections);
        assert_eq!(map.get("s0"), Some("A"));
        // Ambiguous first evidence sticks even though a later segment is clear
        assert_eq!(map.get("s1"), Some("s1"));
    }

    #[test]
    fn window_is_inclusive_and_no_evidence_keeps_id() {
        let detections = vec![Detection::new(7.0, "A")];
        let map = reconcile_speakers(&[seg(4.0, 7.0, "s0"), seg(8.0, 9.0, "s2")], &detections);
        assert_eq!(map.get("s0"), Some("A"));
        assert_eq!(map.get("s2"), Some("s2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn blank_names_are_not_evidence() {
        let detections = vec![Detection::new(5.0, "  ")];
        let map = reconcile_speakers(&[seg(4.0, 7.0, "s0")], &detections);
        assert_eq!(map.get("s0"), Some("s0"));

        let detections = vec![Detection::new(5.0, ""), Detection::new(6.0, "A")];
        let map = reconcile_speakers(&[seg(4.0, 7.0, "s1")], &detections);
        assert_eq!(map.get("s1"), Some("A"));
    }

    #[test]
    fn first_segment_decides_even_without_evidence() {
        let detections = vec![Detection::new(15.0, "B")];
        let segments = vec![seg(0.0, 2.0, "s0"), seg(14.0, 16.0, "s0")];
        let map = reconcile_speakers(&segments, &detections);
        assert_eq!(map.get("s0"), Some("s0"));
    }
}
