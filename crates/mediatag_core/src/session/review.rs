//! Human review hooks between analysis and embedding.

use crate::models::{MediaItem, SpeakerNameMap, TranscriptSegment};

/// Lets a front end confirm people and edit transcripts before embedding.
///
/// Both methods default to accepting the analysis output unchanged.
pub trait ReviewHandler: Send {
    /// Return the people list to embed for `item`.
    fn review_people(&mut self, item: &MediaItem, people: Vec<String>) -> Vec<String> {
        let _ = item;
        people
    }

    /// Edit speaker names and segment text in place.
    fn review_transcript(
        &mut self,
        item: &MediaItem,
        names: &mut SpeakerNameMap,
        segments: &mut Vec<TranscriptSegment>,
    ) {
        let _ = (item, names, segments);
    }
}

/// Accepts every analysis result as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ReviewHandler for AcceptAll {}
