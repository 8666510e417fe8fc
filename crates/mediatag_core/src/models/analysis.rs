//! Results produced by the face and speech analysis stages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One recognized face at a point in the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Seconds from the start of the video.
    pub time: f64,
    pub name: String,
}

impl Detection {
    pub fn new(time: f64, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
        }
    }
}

/// Per-video face recognition results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    names: Vec<String>,
    pub detections: Vec<Detection>,
}

impl FaceData {
    /// Build face data, keeping the first occurrence of each name.
    pub fn new(names: impl IntoIterator<Item = String>, detections: Vec<Detection>) -> Self {
        let mut data = Self {
            names: Vec::new(),
            detections,
        };
        for name in names {
            data.add_name(name);
        }
        data
    }

    /// Distinct recognized names in first-seen order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Add a name unless it is already present or blank.
    pub fn add_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() || self.names.iter().any(|n| n == trimmed) {
            return false;
        }
        self.names.push(trimmed.to_string());
        true
    }

    /// Replace the name list after human review.
    pub fn set_names(&mut self, names: impl IntoIterator<Item = String>) {
        self.names.clear();
        for name in names {
            self.add_name(name);
        }
    }
}

/// A diarized transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
}

impl TranscriptSegment {
    /// Whether `time` lies inside `[start, end]` (inclusive).
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Cleaned transcript for one video.
///
/// `raw` keeps the upstream payload for anything the segments don't model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Distinct speaker ids in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if !seen.contains(&seg.speaker.as_str()) {
                seen.push(&seg.speaker);
            }
        }
        seen
    }
}

/// Speaker id to display name.
///
/// Unknown ids display as themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerNameMap(BTreeMap<String, String>);

impl SpeakerNameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, speaker: &str) -> Option<&str> {
        self.0.get(speaker).map(String::as_str)
    }

    pub fn contains(&self, speaker: &str) -> bool {
        self.0.contains_key(speaker)
    }

    /// Insert a mapping only if the speaker has none yet.
    ///
    /// Returns `true` when the entry was added.
    pub fn insert_if_absent(&mut self, speaker: &str, name: impl Into<String>) -> bool {
        if self.0.contains_key(speaker) {
            return false;
        }
        self.0.insert(speaker.to_string(), name.into());
        true
    }

    /// Overwrite a mapping (review edits).
    pub fn rename(&mut self, speaker: &str, name: impl Into<String>) {
        self.0.insert(speaker.to_string(), name.into());
    }

    /// Display name for a speaker, falling back to the id itself.
    pub fn display_name<'a>(&'a self, speaker: &'a str) -> &'a str {
        self.get(speaker).unwrap_or(speaker)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
