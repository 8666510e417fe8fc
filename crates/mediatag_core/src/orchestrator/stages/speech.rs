//! Speech transcription stage.

use std::process::Command;

use serde_json::Value;

use crate::orchestrator::errors::{StageError, StageResult};
use crate::orchestrator::stage::AnalysisStage;
use crate::orchestrator::types::{Context, VideoState};
use crate::protocol::decode_transcript;

use super::require_file;

/// Runs the transcription/diarization script and records a `Transcript`.
///
/// Invocation: `python <script> <video> <access-token>`
#[derive(Debug, Clone)]
pub struct SpeechStage {
    weight: f64,
}

impl SpeechStage {
    pub fn new() -> Self {
        Self { weight: 1.0 }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl Default for SpeechStage {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStage for SpeechStage {
    fn name(&self) -> &str {
        "Speech"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn check_setup(&self, ctx: &Context) -> StageResult<()> {
        if ctx.tools.python.is_none() {
            return Err(StageError::tool_missing("python3"));
        }
        if ctx.tools.access_token.trim().is_empty() {
            return Err(StageError::tool_missing(
                "access token for the speech stage (tools.access_token)",
            ));
        }
        require_file("speech script", &ctx.tools.speech_script)
    }

    fn validate_input(&self, _ctx: &Context, video: &VideoState) -> StageResult<()> {
        require_file("video", video.path())
    }

    fn command(&self, ctx: &Context, video: &VideoState) -> StageResult<Command> {
        let python = ctx
            .tools
            .python
            .as_ref()
            .ok_or_else(|| StageError::tool_missing("python3"))?;

        let mut cmd = Command::new(python);
        cmd.env("PYTHONUNBUFFERED", "1")
            .arg(&ctx.tools.speech_script)
            .arg(video.path())
            .arg(&ctx.tools.access_token);
        Ok(cmd)
    }

    fn secrets<'a>(&self, ctx: &'a Context) -> Vec<&'a str> {
        vec![ctx.tools.access_token.as_str()]
    }

    fn record_result(&self, payload: &Value, video: &mut VideoState) -> StageResult<()> {
        let transcript = decode_transcript(payload)?;
        tracing::debug!(
            "{}: {} segment(s) kept",
            video.item.file_name(),
            transcript.segments.len()
        );
        video.transcript = Some(transcript);
        Ok(())
    }

    fn validate_output(&self, video: &VideoState) -> StageResult<()> {
        match video.transcript {
            Some(_) => Ok(()),
            None => Err(StageError::invalid_output("transcript not recorded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaItem;
    use serde_json::json;

    #[test]
    fn rejects_payload_without_segments() {
        let stage = SpeechStage::new();
        let mut video = VideoState::new(MediaItem::from_path("/media/clip.mp4").unwrap());
        let err = stage
            .record_result(&json!({"text": "hello"}), &mut video)
            .unwrap_err();
        assert!(matches!(err, StageError::Protocol(_)));
        assert!(stage.validate_output(&video).is_err());
    }

    #[test]
    fn records_transcript() {
        let stage = SpeechStage::new().with_weight(2.0);
        assert_eq!(stage.weight(), 2.0);

        let mut video = VideoState::new(MediaItem::from_path("/media/clip.mp4").unwrap());
        stage
            .record_result(
                &json!({"segments": [{"start": 0.0, "end": 1.0, "text": "hi"}]}),
                &mut video,
            )
            .unwrap();
        let transcript = video.transcript.unwrap();
        assert_eq!(transcript.segments[0].speaker, "speaker0");
    }
}
