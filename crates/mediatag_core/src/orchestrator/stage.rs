//! Analysis stage trait definition.

use std::process::Command;

use serde_json::Value;

use super::errors::StageResult;
use super::types::{Context, VideoState};

/// One external analysis pass run against each video.
///
/// The pipeline drives a stage like this:
///
/// 1. `check_setup` - once per batch, before any video
/// 2. `validate_input` - per video, before launching
/// 3. `command` - build the subprocess; the pipeline runs it and
///    parses its line protocol
/// 4. `record_result` - store the decoded `RESULTS:` payload
/// 5. `validate_output` - verify the state was populated
pub trait AnalysisStage: Send + Sync {
    /// Stage name (for logging, progress and error context).
    fn name(&self) -> &str;

    /// Relative share of a video's progress.
    fn weight(&self) -> f64 {
        1.0
    }

    /// Check tools and resources the stage depends on.
    fn check_setup(&self, ctx: &Context) -> StageResult<()>;

    fn validate_input(&self, ctx: &Context, video: &VideoState) -> StageResult<()>;

    fn command(&self, ctx: &Context, video: &VideoState) -> StageResult<Command>;

    /// Command arguments masked when the command line is logged.
    fn secrets<'a>(&self, _ctx: &'a Context) -> Vec<&'a str> {
        Vec::new()
    }

    fn record_result(&self, payload: &Value, video: &mut VideoState) -> StageResult<()>;

    fn validate_output(&self, video: &VideoState) -> StageResult<()>;
}
