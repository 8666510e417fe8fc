//! The tagging session: analysis, review, embedding, routing, sidecars.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::config::Settings;
use crate::embed::{EmbedMetadata, MetadataEmbedder};
use crate::logging::RunLogger;
use crate::models::{compose_description, MediaItem, SpeakerNameMap, TranscriptSegment};
use crate::orchestrator::{
    create_pipeline, AnalysisOptions, AnalysisReport, BatchOutcome, Context, ToolPaths,
};
use crate::process::CancelToken;
use crate::reconcile::reconcile_speakers;
use crate::routing::{DestinationRouter, RouteTarget};
use crate::sidecar::{render_transcript, write_sidecar, SidecarHeader};

use super::errors::SessionResult;
use super::request::TaggingRequest;
use super::review::ReviewHandler;
use super::types::{ItemFailure, SessionEvent, SessionOutcome, SessionSummary};

/// Reviewed analysis output for one item.
struct ItemPlan {
    item: MediaItem,
    people: Vec<String>,
    transcript: Option<(Vec<TranscriptSegment>, SpeakerNameMap)>,
}

/// Runs one batch end to end on the calling thread.
///
/// Progress, warnings and per-item failures go out over the event
/// channel; the summary comes back by value. Validation and cancellation
/// are the only things that stop the whole batch.
pub struct TaggingSession {
    settings: Settings,
    tools: ToolPaths,
    options: AnalysisOptions,
    logger: Arc<RunLogger>,
}

impl TaggingSession {
    pub fn new(settings: Settings, logger: Arc<RunLogger>) -> Self {
        let tools = ToolPaths::from_settings(&settings);
        let options = AnalysisOptions::from_settings(&settings);
        Self {
            settings,
            tools,
            options,
            logger,
        }
    }

    /// Override discovered tool paths.
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn run(
        &self,
        request: &TaggingRequest,
        review: &mut dyn ReviewHandler,
        cancel: &CancelToken,
        events: &Sender<SessionEvent>,
    ) -> SessionResult<SessionOutcome> {
        let emit = |event: SessionEvent| {
            let _ = events.send(event);
        };

        request.validate(&self.tools)?;
        self.logger.phase(&format!(
            "Tagging {} file(s) for {}",
            request.items.len(),
            request.date
        ));

        let analysis = match self.analyze(request, cancel, events)? {
            Some(report) => report,
            None => return Ok(self.cancelled()),
        };

        let mut summary = SessionSummary::default();
        for outcome in analysis.failures() {
            let message = outcome
                .failure
                .as_ref()
                .map(|f| f.to_string())
                .unwrap_or_default();
            emit(SessionEvent::ItemFailed {
                file: outcome.item.path().to_path_buf(),
                message: message.clone(),
            });
            summary.analysis_failures.push(ItemFailure {
                file: outcome.item.path().to_path_buf(),
                message,
            });
        }

        let plans = self.review(request, &analysis, review);
        if cancel.is_cancelled() {
            return Ok(self.cancelled());
        }

        // Embedding
        emit(SessionEvent::Phase("Embedding metadata".into()));
        self.logger.phase("Embedding metadata");
        let tags = request.review.apply(&request.tags);
        let embedder = MetadataEmbedder::new(self.tools.ffmpeg.clone());
        let count = plans.len();
        let mut temps = Vec::with_capacity(count);

        for (index, plan) in plans.iter().enumerate() {
            if cancel.is_cancelled() {
                // Dropping `temps` deletes every tagged copy made so far
                return Ok(self.cancelled());
            }
            let meta = EmbedMetadata::new(
                compose_description(&tags, &plan.people),
                request.date,
                request.location.clone(),
            )
            .with_utc_offset_minutes(self.settings.embedding.utc_offset_minutes);

            match embedder.embed(&plan.item, &meta) {
                Ok(temp) => temps.push(temp),
                Err(e) => {
                    self.logger
                        .error(&format!("Embedding failed for {}: {}", plan.item.file_name(), e));
                    emit(SessionEvent::ItemFailed {
                        file: plan.item.path().to_path_buf(),
                        message: e.to_string(),
                    });
                    summary.embed_failures.push(ItemFailure {
                        file: plan.item.path().to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
            emit(SessionEvent::Embedded {
                index: index + 1,
                count,
                file_name: plan.item.file_name(),
            });
        }

        if cancel.is_cancelled() {
            return Ok(self.cancelled());
        }

        // Routing
        emit(SessionEvent::Phase("Placing files".into()));
        self.logger.phase("Placing files");
        let target = match request.copy {
            None => RouteTarget::Local,
            Some(mode) => RouteTarget::Network {
                mode,
                date: request.date,
                projects: request.projects.clone(),
            },
        };
        let router = DestinationRouter::from_settings(&self.settings, request.allow_mount);
        let routing = router.route(temps, &target, |p| emit(SessionEvent::Copy(p.clone())));

        for warning in &routing.warnings {
            self.logger.warn(warning);
            emit(SessionEvent::Warning(warning.clone()));
        }
        for failure in &routing.failures {
            self.logger.error(&failure.error.to_string());
            emit(SessionEvent::ItemFailed {
                file: failure.original.clone(),
                message: failure.error.to_string(),
            });
        }
        summary.warnings.extend(routing.warnings.iter().cloned());

        // Sidecars
        if self.settings.embedding.write_sidecar {
            for plan in &plans {
                let Some((ref segments, ref names)) = plan.transcript else {
                    continue;
                };
                let Some(dest) = routing.destination_of(plan.item.path()) else {
                    continue;
                };
                let header = SidecarHeader {
                    project: request
                        .projects
                        .project_for(plan.item.path())
                        .map(str::to_string),
                    location: request.location.as_ref().map(|l| l.display_name.clone()),
                };
                match write_sidecar(dest, &render_transcript(segments, names, &header)) {
                    Ok(path) => summary.sidecars.push(path),
                    Err(e) => {
                        let warning =
                            format!("Transcript for {} not written: {}", plan.item.file_name(), e);
                        self.logger.warn(&warning);
                        emit(SessionEvent::Warning(warning.clone()));
                        summary.warnings.push(warning);
                    }
                }
            }
        }

        summary.routing = routing;
        self.logger.success(&format!(
            "Done: {} placed, {} failed",
            summary.placed_count(),
            summary.analysis_failures.len()
                + summary.embed_failures.len()
                + summary.routing.failures.len()
        ));
        self.logger.flush();
        Ok(SessionOutcome::Completed(summary))
    }

    /// Run the analysis stages over the request's videos.
    ///
    /// `None` means the batch was cancelled.
    fn analyze(
        &self,
        request: &TaggingRequest,
        cancel: &CancelToken,
        events: &Sender<SessionEvent>,
    ) -> SessionResult<Option<AnalysisReport>> {
        let videos = request.videos();
        if videos.is_empty() {
            return Ok(Some(AnalysisReport::default()));
        }

        let _ = events.send(SessionEvent::Phase("Analyzing videos".into()));
        let pipeline =
            create_pipeline(&self.settings, request.transcribe).with_cancel_token(cancel.clone());
        let sender = events.clone();
        let ctx = Context::new(self.tools.clone(), self.options.clone(), Arc::clone(&self.logger))
            .with_progress_callback(Box::new(move |update| {
                let _ = sender.send(SessionEvent::Analysis(update.clone()));
            }));

        match pipeline.run(&ctx, &videos)? {
            BatchOutcome::Completed(report) => Ok(Some(report)),
            BatchOutcome::Cancelled => Ok(None),
        }
    }

    /// Reconcile speakers and pass everything through the review hooks.
    ///
    /// Videos whose analysis failed keep an empty people list.
    fn review(
        &self,
        request: &TaggingRequest,
        analysis: &AnalysisReport,
        review: &mut dyn ReviewHandler,
    ) -> Vec<ItemPlan> {
        let mut plans = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let outcome = analysis.get(item.path());
            let people = outcome.map(|o| o.people().to_vec()).unwrap_or_default();
            let people = review.review_people(item, people);

            let transcript = match outcome {
                Some(o) => match o.transcript {
                    Some(ref t) if !t.is_empty() => {
                        let detections = o
                            .face
                            .as_ref()
                            .map(|f| f.detections.as_slice())
                            .unwrap_or(&[]);
                        let mut segments = t.segments.clone();
                        let mut names = reconcile_speakers(&segments, detections);
                        review.review_transcript(item, &mut names, &mut segments);
                        Some((segments, names))
                    }
                    _ => None,
                },
                None => None,
            };

            plans.push(ItemPlan {
                item: item.clone(),
                people,
                transcript,
            });
        }
        plans
    }

    fn cancelled(&self) -> SessionOutcome {
        self.logger.warn("Session cancelled; no files were placed");
        self.logger.flush();
        SessionOutcome::Cancelled
    }
}
