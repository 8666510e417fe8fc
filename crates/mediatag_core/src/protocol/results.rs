//! Decoding of `RESULTS:` payloads.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Detection, FaceData, Transcript, TranscriptSegment};

/// A `RESULTS:` payload that doesn't match the stage's contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Unexpected {stage} payload: {message}")]
    UnexpectedPayload { stage: String, message: String },

    #[error("{stage} stage exited without a RESULTS line")]
    MissingResults { stage: String },
}

impl ProtocolError {
    pub fn unexpected(stage: &str, message: impl Into<String>) -> Self {
        Self::UnexpectedPayload {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FacePayload {
    Full {
        #[serde(default)]
        names: Vec<String>,
        #[serde(default)]
        detections: Vec<RawDetection>,
    },
    NamesOnly(Vec<String>),
}

#[derive(Deserialize)]
struct RawDetection {
    time: f64,
    name: String,
}

/// Decode the face stage payload.
///
/// Accepts `{names, detections}` or a bare array of names. Names that
/// appear only in detections are added after the listed ones.
pub fn decode_face_results(value: &Value) -> Result<FaceData, ProtocolError> {
    let payload = FacePayload::deserialize(value)
        .map_err(|e| ProtocolError::unexpected("face", e.to_string()))?;

    let (names, raw) = match payload {
        FacePayload::Full { names, detections } => (names, detections),
        FacePayload::NamesOnly(names) => (names, Vec::new()),
    };

    let mut detections = Vec::with_capacity(raw.len());
    for d in raw {
        if !d.time.is_finite() || d.time < 0.0 {
            return Err(ProtocolError::unexpected(
                "face",
                format!("invalid detection time {} for '{}'", d.time, d.name),
            ));
        }
        let name = d.name.trim();
        if name.is_empty() {
            continue;
        }
        detections.push(Detection::new(d.time, name));
    }

    let mut data = FaceData::new(names, Vec::new());
    for d in &detections {
        data.add_name(d.name.clone());
    }
    data.detections = detections;
    Ok(data)
}

#[derive(Deserialize)]
struct TranscriptPayload {
    segments: Vec<RawSegment>,
}

#[derive(Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    speaker: Option<String>,
}

/// Decode the speech stage payload.
///
/// Segments whose text is empty after trimming are dropped first; any
/// kept segment without a speaker id gets `speaker<N>`, where `N` is its
/// position among the kept segments.
pub fn decode_transcript(value: &Value) -> Result<Transcript, ProtocolError> {
    let payload = TranscriptPayload::deserialize(value)
        .map_err(|e| ProtocolError::unexpected("speech", e.to_string()))?;

    let segments = payload
        .segments
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .enumerate()
        .map(|(idx, s)| {
            let speaker = s
                .speaker
                .map(|sp| sp.trim().to_string())
                .filter(|sp| !sp.is_empty())
                .unwrap_or_else(|| format!("speaker{}", idx));
            TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
                speaker,
            }
        })
        .collect();

    Ok(Transcript {
        segments,
        raw: value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_face_payload() {
        let value = json!({
            "names": ["Ada", "Bob"],
            "detections": [
                {"time": 1.5, "name": "Ada"},
                {"time": 3.0, "name": "Cy"}
            ]
        });
        let data = decode_face_results(&value).unwrap();
        assert_eq!(data.names(), &["Ada", "Bob", "Cy"]);
        assert_eq!(data.detections.len(), 2);
        assert_eq!(data.detections[1], Detection::new(3.0, "Cy"));
    }

    #[test]
    fn blank_detection_names_are_dropped() {
        let value = json!({
            "names": [],
            "detections": [
                {"time": 1.0, "name": "   "},
                {"time": 2.0, "name": " Ada "}
            ]
        });
        let data = decode_face_results(&value).unwrap();
        assert_eq!(data.detections, vec![Detection::new(2.0, "Ada")]);
        assert_eq!(data.names(), &["Ada"]);
    }

    #[test]
    fn decodes_names_only_payload() {
        let data = decode_face_results(&json!(["Ada", "Ada", "Bob"])).unwrap();
        assert_eq!(data.names(), &["Ada", "Bob"]);
        assert!(data.detections.is_empty());
    }

    #[test]
    fn rejects_wrong_face_shape() {
        assert!(decode_face_results(&json!({"names": "Ada"})).is_err());
        assert!(decode_face_results(&json!(42)).is_err());
        assert!(decode_face_results(&json!({"detections": [{"time": -1.0, "name": "A"}]})).is_err());
    }

    #[test]
    fn transcript_drops_blank_and_assigns_speakers() {
        let value = json!({
            "language": "en",
            "segments": [
                {"start": 0.0, "end": 1.0, "text": "  ", "speaker": "SPEAKER_00"},
                {"start": 1.0, "end": 2.0, "text": " Hello ", "speaker": "SPEAKER_00"},
                {"start": 2.0, "end": 3.0, "text": "there"},
                {"start": 3.0, "end": 4.0, "text": "again", "speaker": ""}
            ]
        });
        let transcript = decode_transcript(&value).unwrap();
        assert_eq!(transcript.segments.len(), 3);
        assert_eq!(transcript.segments[0].text, "Hello");
        assert_eq!(transcript.segments[0].speaker, "SPEAKER_00");
        assert_eq!(transcript.segments[1].speaker, "speaker1");
        assert_eq!(transcript.segments[2].speaker, "speaker2");
        assert_eq!(transcript.raw["language"], "en");
    }

    #[test]
    fn transcript_requires_segments() {
        assert!(decode_transcript(&json!({"text": "hi"})).is_err());
    }
}
