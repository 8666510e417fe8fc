//! Analysis orchestrator for the external face and speech tools.
//!
//! Each video in a batch goes through a fixed sequence of stages; each
//! stage is one subprocess speaking the line protocol in
//! [`crate::protocol`]. Progress from all stages and videos is blended
//! into one monotonic percentage, and one cancel token stops everything.
//!
//! # Architecture
//!
//! ```text
//! AnalysisPipeline
//!     ├── Stage: Face    (always)
//!     └── Stage: Speech  (when transcription is requested)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mediatag_core::orchestrator::{create_pipeline, BatchOutcome, Context};
//!
//! let pipeline = create_pipeline(&settings, true);
//! let cancel = pipeline.cancel_handle();
//!
//! match pipeline.run(&ctx, &videos)? {
//!     BatchOutcome::Completed(report) => println!("{} ok", report.succeeded()),
//!     BatchOutcome::Cancelled => println!("cancelled, results discarded"),
//! }
//! ```

mod errors;
mod pipeline;
mod progress;
mod stage;
pub mod stages;
mod types;

pub use errors::{PipelineError, PipelineResult, StageError, StageResult};
pub use pipeline::AnalysisPipeline;
pub use progress::{BatchProgress, StageSlices};
pub use stage::AnalysisStage;
pub use stages::{FaceStage, SpeechStage};
pub use types::{
    AnalysisOptions, AnalysisReport, BatchOutcome, Context, ProgressCallback, ProgressUpdate,
    ToolPaths, VideoOutcome, VideoState, VideoStatus,
};

use crate::config::Settings;

/// Build the standard pipeline.
///
/// 1. Face - recognize people and record detections
/// 2. Speech - transcribe and diarize (only with `transcribe`)
pub fn create_pipeline(settings: &Settings, transcribe: bool) -> AnalysisPipeline {
    let mut pipeline = AnalysisPipeline::new()
        .with_stage(FaceStage::new().with_weight(settings.analysis.face_weight));
    if transcribe {
        pipeline.add_stage(SpeechStage::new().with_weight(settings.analysis.speech_weight));
    }
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_stage_is_optional() {
        let settings = Settings::default();
        assert_eq!(create_pipeline(&settings, false).stage_names(), vec!["Face"]);
        assert_eq!(
            create_pipeline(&settings, true).stage_names(),
            vec!["Face", "Speech"]
        );
    }
}
