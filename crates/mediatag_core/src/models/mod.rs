//! Data models for Media Tagger.
//!
//! This module contains the core data structures shared across the crate:
//! - Media items and their kind (photo/video)
//! - Tagging parameters (tags, location, capture date, review flags)
//! - Analysis results (face detections, transcript segments, speaker names)
//! - Routing choices (copy mode, per-item project names)

mod analysis;
mod media;
mod project;
mod tagging;

pub use analysis::{Detection, FaceData, SpeakerNameMap, Transcript, TranscriptSegment};
pub use media::{MediaItem, MediaKind};
pub use project::{CopyMode, ProjectAssignment};
pub use tagging::{compose_description, CaptureDate, Location, ModelError, ReviewFlags, TagSet};
