//! Core types for the analysis pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{FaceData, MediaItem, Transcript};
use crate::process::find_executable;

use super::errors::PipelineError;

/// One progress reading for the whole batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// Zero-based index of the video being analysed.
    pub video_index: usize,
    pub video_count: usize,
    pub file_name: String,
    pub stage: String,
    /// Blended progress of the current video, 0..=100.
    pub video_percent: f64,
    /// Blended progress of the batch, 0..=100.
    pub overall_percent: f64,
}

/// Progress callback type for reporting pipeline progress.
pub type ProgressCallback = Box<dyn Fn(&ProgressUpdate) + Send + Sync>;

/// Executables and resources the stages hand to their subprocesses.
///
/// Executables that could not be found are `None`; stages report that
/// during setup checks instead of at launch.
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    pub python: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub face_script: PathBuf,
    pub face_index: PathBuf,
    pub names_database: PathBuf,
    pub speech_script: PathBuf,
    pub access_token: String,
}

impl ToolPaths {
    /// Resolve tools from settings (override, search dirs, then `PATH`).
    pub fn from_settings(settings: &Settings) -> Self {
        let tools = &settings.tools;
        let dirs = tools.search_dirs();
        let locate = |name: &str, configured: &str| {
            let configured = Settings::tool_override(configured);
            match find_executable(name, configured.as_deref(), &dirs) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::debug!("{}", e);
                    None
                }
            }
        };

        Self {
            python: locate("python3", &tools.python),
            ffmpeg: locate("ffmpeg", &tools.ffmpeg),
            ffprobe: locate("ffprobe", &tools.ffprobe),
            face_script: settings.resource_path(&tools.face_script),
            face_index: settings.resource_path(&tools.face_index),
            names_database: settings.resource_path(&tools.names_database),
            speech_script: settings.resource_path(&tools.speech_script),
            access_token: tools.access_token.clone(),
        }
    }
}

/// Analysis options shared by every stage in a batch.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Ask the face tool for its preview window.
    pub preview: bool,
    pub frame_skip: u32,
    pub resize_width: u32,
    /// Cancellation polling interval while a subprocess runs.
    pub poll_interval: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            preview: false,
            frame_skip: 5,
            resize_width: 640,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl AnalysisOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let analysis = &settings.analysis;
        Self {
            preview: analysis.preview,
            frame_skip: analysis.frame_skip.max(1),
            resize_width: analysis.resize_width,
            poll_interval: Duration::from_millis(analysis.poll_interval_ms.max(1)),
        }
    }
}

/// Read-only context passed to stages.
pub struct Context {
    pub tools: ToolPaths,
    pub options: AnalysisOptions,
    pub logger: Arc<RunLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(tools: ToolPaths, options: AnalysisOptions, logger: Arc<RunLogger>) -> Self {
        Self {
            tools,
            options,
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, update: &ProgressUpdate) {
        if let Some(ref callback) = self.progress_callback {
            callback(update);
        }
    }
}

/// Where a video is in its per-stage lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    Pending,
    /// A stage subprocess is running.
    Running(String),
    /// A stage finished and its result was recorded.
    StageDone(String),
    /// A stage failed; later stages were skipped.
    Failed(String),
    /// Every stage completed.
    Finished,
}

/// Mutable per-video state filled in by stages.
#[derive(Debug, Clone)]
pub struct VideoState {
    pub item: MediaItem,
    pub status: VideoStatus,
    pub face: Option<FaceData>,
    pub transcript: Option<Transcript>,
}

impl VideoState {
    pub fn new(item: MediaItem) -> Self {
        Self {
            item,
            status: VideoStatus::Pending,
            face: None,
            transcript: None,
        }
    }

    pub fn path(&self) -> &Path {
        self.item.path()
    }
}

/// Final result for one video.
#[derive(Debug)]
pub struct VideoOutcome {
    pub item: MediaItem,
    pub status: VideoStatus,
    pub face: Option<FaceData>,
    pub transcript: Option<Transcript>,
    /// Set when a stage failed.
    pub failure: Option<PipelineError>,
}

impl VideoOutcome {
    pub(crate) fn from_state(state: VideoState, failure: Option<PipelineError>) -> Self {
        Self {
            item: state.item,
            status: state.status,
            face: state.face,
            transcript: state.transcript,
            failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Recognized names, empty when face analysis didn't complete.
    pub fn people(&self) -> &[String] {
        self.face.as_ref().map(|f| f.names()).unwrap_or(&[])
    }
}

/// Results of a completed (not cancelled) analysis batch.
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub videos: Vec<VideoOutcome>,
}

impl AnalysisReport {
    pub fn get(&self, path: &Path) -> Option<&VideoOutcome> {
        self.videos.iter().find(|v| v.item.path() == path)
    }

    pub fn succeeded(&self) -> usize {
        self.videos.iter().filter(|v| v.is_success()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &VideoOutcome> {
        self.videos.iter().filter(|v| !v.is_success())
    }
}

/// Outcome of a batch: completed (possibly with per-video failures) or cancelled.
///
/// A cancelled batch carries no results.
#[derive(Debug)]
pub enum BatchOutcome {
    Completed(AnalysisReport),
    Cancelled,
}

impl BatchOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchOutcome::Cancelled)
    }
}
