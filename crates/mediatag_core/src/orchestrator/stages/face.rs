//! Face recognition stage.

use std::process::Command;

use serde_json::Value;

use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::AnalysisStage;
use crate::orchestrator::types::{Context, VideoState};
use crate::protocol::decode_face_results;

use super::require_file;

/// Runs the face recognition script and records `FaceData`.
///
/// Invocation:
/// `python <script> <video> <index> <names> --ffmpeg-path <p> --ffprobe-path <p>
///  --frame-skip <n> --resize-width <w> [--preview]`
#[derive(Debug, Clone)]
pub struct FaceStage {
    weight: f64,
}

impl FaceStage {
    pub fn new() -> Self {
        Self { weight: 1.0 }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl Default for FaceStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStage for FaceStage {
    fn name(&self) -> &str {
        "Face"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn check_setup(&self, ctx: &Context) -> StageResult<()> {
        let tools = &ctx.tools;
        if tools.python.is_none() {
            return Err(StageError::tool_missing("python3"));
        }
        if tools.ffmpeg.is_none() {
            return Err(StageError::tool_missing("ffmpeg"));
        }
        if tools.ffprobe.is_none() {
            return Err(StageError::tool_missing("ffprobe"));
        }
        require_file("face script", &tools.face_script)?;
        require_file("face index", &tools.face_index)?;
        require_file("names database", &tools.names_database)?;
        Ok(())
    }

    fn validate_input(&self, _ctx: &Context, video: &VideoState) -> StageResult<()> {
        if !video.item.is_video() {
            return Err(StageError::invalid_input(format!(
                "{} is not a video",
                video.item.file_name()
            )));
        }
        require_file("video", video.path())
    }

    fn command(&self, ctx: &Context, video: &VideoState) -> StageResult<Command> {
        let tools = &ctx.tools;
        let python = tools
            .python
            .as_ref()
            .ok_or_else(|| StageError::tool_missing("python3"))?;
        let ffmpeg = tools
            .ffmpeg
            .as_ref()
            .ok_or_else(|| StageError::tool_missing("ffmpeg"))?;
        let ffprobe = tools
            .ffprobe
            .as_ref()
            .ok_or_else(|| StageError::tool_missing("ffprobe"))?;

        let mut cmd = Command::new(python);
        cmd.env("PYTHONUNBUFFERED", "1")
            .arg(&tools.face_script)
            .arg(video.path())
            .arg(&tools.face_index)
            .arg(&tools.names_database)
            .arg("--ffmpeg-path")
            .arg(ffmpeg)
            .arg("--ffprobe-path")
            .arg(ffprobe)
            .arg("--frame-skip")
            .arg(ctx.options.frame_skip.to_string())
            .arg("--resize-width")
            .arg(ctx.options.resize_width.to_string());
        if ctx.options.preview {
            cmd.arg("--preview");
        }
        Ok(cmd)
    }

    fn record_result(&self, payload: &Value, video: &mut VideoState) -> StageResult<()> {
        let data = decode_face_results(payload)?;
        tracing::debug!(
            "{}: {} name(s), {} detection(s)",
            video.item.file_name(),
            data.names().len(),
            data.detections.len()
        );
        video.face = Some(data);
        Ok(())
    }

    fn validate_output(&self, video: &VideoState) -> StageResult<()> {
        if video.face.is_none() {
            return Err(StageError::invalid_output("face results not recorded"));
        }
        Ok(())
    }
}
