//! Batch runner that drives every stage over every video in order.

use serde_json::Value;

use crate::models::MediaItem;
use crate::process::{run_streaming, CancelToken, RunOutcome};
use crate::protocol::{parse_line, ProtocolError, ProtocolLine, RESULTS_PREFIX};

use super::errors::{PipelineError, PipelineResult, StageError, StageResult};
use super::progress::{BatchProgress, StageSlices};
use super::stage::AnalysisStage;
use super::types::{
    AnalysisReport, BatchOutcome, Context, ProgressUpdate, VideoOutcome, VideoState, VideoStatus,
};

/// Sequential analysis pipeline.
///
/// Videos run in input order and stages in insertion order; only one
/// subprocess is alive at a time. A stage failure ends that video's
/// processing and the batch moves on. Cancellation kills the running
/// subprocess and discards everything gathered so far.
pub struct AnalysisPipeline {
    stages: Vec<Box<dyn AnalysisStage>>,
    cancel: CancelToken,
}

/// How one stage run ended.
enum StageRun {
    Done,
    Cancelled,
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    pub fn add_stage<S: AnalysisStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a stage (builder pattern).
    pub fn with_stage<S: AnalysisStage + 'static>(mut self, stage: S) -> Self {
        self.add_stage(stage);
        self
    }

    /// Share an existing cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for cancelling the batch from another thread.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Check every stage's tools and resources.
    pub fn preflight(&self, ctx: &Context) -> PipelineResult<()> {
        if self.stages.is_empty() {
            return Err(PipelineError::setup_failed("no analysis stages configured"));
        }
        for stage in &self.stages {
            stage.check_setup(ctx).map_err(|e| {
                PipelineError::setup_failed(format!("{} stage: {}", stage.name(), e))
            })?;
        }
        Ok(())
    }

    /// Analyse `videos`.
    ///
    /// Returns `Err` only for setup problems found before any subprocess
    /// starts. Per-video failures are recorded in the report.
    pub fn run(&self, ctx: &Context, videos: &[MediaItem]) -> PipelineResult<BatchOutcome> {
        if videos.iter().any(|v| !v.is_video()) {
            return Err(PipelineError::validation_failed(
                "analysis only accepts video items",
            ));
        }
        if videos.is_empty() {
            return Ok(BatchOutcome::Completed(AnalysisReport::default()));
        }
        self.preflight(ctx)?;

        let weights: Vec<f64> = self.stages.iter().map(|s| s.weight()).collect();
        let mut progress = BatchProgress::new(videos.len(), StageSlices::new(&weights));
        let mut report = AnalysisReport::default();

        ctx.logger.phase(&format!(
            "Analysis: {} video(s), stages: {}",
            videos.len(),
            self.stage_names().join(" → ")
        ));

        for (index, item) in videos.iter().enumerate() {
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Cancelled before video {}", item.file_name()));
                return Ok(BatchOutcome::Cancelled);
            }

            progress.start_video(index);
            ctx.logger.section(&format!(
                "Video {}/{}: {}",
                index + 1,
                videos.len(),
                item.file_name()
            ));

            let mut state = VideoState::new(item.clone());
            let mut failure = None;

            for (stage_index, stage) in self.stages.iter().enumerate() {
                if self.is_cancelled() {
                    ctx.logger
                        .warn(&format!("Cancelled before stage '{}'", stage.name()));
                    return Ok(BatchOutcome::Cancelled);
                }

                state.status = VideoStatus::Running(stage.name().to_string());
                match self.run_stage(ctx, stage.as_ref(), stage_index, &mut state, &mut progress)
                {
                    Ok(StageRun::Done) => {
                        state.status = VideoStatus::StageDone(stage.name().to_string());
                        progress.complete_stage(stage_index);
                        ctx.logger.success(&format!("{} completed", stage.name()));
                    }
                    Ok(StageRun::Cancelled) => {
                        ctx.logger.warn(&format!(
                            "Cancelled during stage '{}' of {}",
                            stage.name(),
                            item.file_name()
                        ));
                        return Ok(BatchOutcome::Cancelled);
                    }
                    Err(e) => {
                        ctx.logger.error(&format!("{} failed: {}", stage.name(), e));
                        ctx.logger.show_tail(stage.name());
                        state.status = VideoStatus::Failed(stage.name().to_string());
                        failure = Some(PipelineError::stage_failed(
                            item.file_name(),
                            stage.name(),
                            e,
                        ));
                        break;
                    }
                }
            }

            if failure.is_none() {
                state.status = VideoStatus::Finished;
            }
            progress.finish_video();
            self.report(ctx, &progress, index, videos.len(), item, "Done");
            report.videos.push(VideoOutcome::from_state(state, failure));
        }

        ctx.logger.success(&format!(
            "Analysis finished: {}/{} video(s) succeeded",
            report.succeeded(),
            videos.len()
        ));
        Ok(BatchOutcome::Completed(report))
    }

    fn run_stage(
        &self,
        ctx: &Context,
        stage: &dyn AnalysisStage,
        stage_index: usize,
        state: &mut VideoState,
        progress: &mut BatchProgress,
    ) -> StageResult<StageRun> {
        stage.validate_input(ctx, state)?;

        let cmd = stage.command(ctx, state)?;
        ctx.logger.command_masked(&cmd, &stage.secrets(ctx));
        ctx.logger.clear_tail();

        let (video_index, video_count) = (progress.current_video(), progress.video_count());
        let mut payload: Option<Value> = None;
        let mut bad_results: Option<String> = None;
        let item = state.item.clone();

        let outcome = run_streaming(cmd, &self.cancel, ctx.options.poll_interval, |line| {
            match parse_line(line) {
                ProtocolLine::Progress(pct) => {
                    if progress.stage_progress(stage_index, pct) {
                        self.report(ctx, progress, video_index, video_count, &item, stage.name());
                    }
                }
                ProtocolLine::Result(value) => payload = Some(value),
                ProtocolLine::Log(text) => ctx.logger.output_line(&text, false),
                ProtocolLine::Malformed { line, reason } => {
                    ctx.logger.output_line(&line, false);
                    ctx.logger.debug(&format!("Ignoring malformed line: {}", reason));
                    if line.starts_with(RESULTS_PREFIX) {
                        bad_results = Some(reason);
                    }
                }
            }
        })?;

        match outcome {
            RunOutcome::Cancelled => Ok(StageRun::Cancelled),
            RunOutcome::Exited { code, stderr } => {
                for line in stderr.lines() {
                    ctx.logger.output_line(line, true);
                }
                if code != 0 {
                    return Err(StageError::command_failed(stage.name(), code, stderr.trim()));
                }
                let payload = match (payload, bad_results) {
                    (Some(payload), _) => payload,
                    (None, Some(reason)) => {
                        return Err(ProtocolError::unexpected(stage.name(), reason).into())
                    }
                    (None, None) => {
                        return Err(ProtocolError::MissingResults {
                            stage: stage.name().to_string(),
                        }
                        .into())
                    }
                };
                stage.record_result(&payload, state)?;
                stage.validate_output(state)?;
                Ok(StageRun::Done)
            }
        }
    }

    fn report(
        &self,
        ctx: &Context,
        progress: &BatchProgress,
        video_index: usize,
        video_count: usize,
        item: &MediaItem,
        stage: &str,
    ) {
        let overall = progress.overall_percent();
        ctx.logger.progress(overall as u32);
        ctx.report_progress(&ProgressUpdate {
            video_index,
            video_count,
            file_name: item.file_name(),
            stage: stage.to_string(),
            video_percent: progress.video_percent(),
            overall_percent: overall,
        });
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
