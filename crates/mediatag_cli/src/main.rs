//! media-tagger: tag photos and videos from the command line.
//!
//! Usage:
//!   media-tagger ~/shoot --tag "gala, stage" --lat 51.5 --lon -0.12 --date 2024-04-20
//!   media-tagger clip.mov --tag promo --transcribe --copy broll --project "Fall Gala"

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use mediatag_core::config::{ConfigManager, VersionMarker};
use mediatag_core::discovery::collect_media;
use mediatag_core::logging::{init_tracing, LogLevel, RunLogger};
use mediatag_core::models::{
    CaptureDate, CopyMode, Location, ProjectAssignment, ReviewFlags, TagSet,
};
use mediatag_core::process::CancelToken;
use mediatag_core::session::{
    AcceptAll, SessionEvent, SessionOutcome, SessionSummary, TaggingRequest, TaggingSession,
};

#[derive(Parser)]
#[command(name = "media-tagger")]
#[command(about = "Embed tags, people, location and date into photos and videos")]
#[command(version)]
struct Args {
    /// Photos, videos or folders to tag
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Tag text; commas separate several tags (repeatable)
    #[arg(short, long = "tag", value_name = "TAGS")]
    tags: Vec<String>,

    /// Display name of the location
    #[arg(long)]
    location_name: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<String>,

    /// Capture date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<CaptureDate>,

    /// Add the "Reviewed by Legal" tag
    #[arg(long)]
    legal: bool,

    /// Add the "Reviewed by Safety" tag
    #[arg(long)]
    safety: bool,

    /// Transcribe and diarize videos
    #[arg(long)]
    transcribe: bool,

    /// Show the face tool's preview window
    #[arg(long)]
    preview: bool,

    /// Copy to the network share: finished | broll
    #[arg(long, value_name = "MODE")]
    copy: Option<CopyMode>,

    /// Project name for B-roll copies
    #[arg(long)]
    project: Option<String>,

    /// Don't run the mount helper when the share is missing
    #[arg(long)]
    no_mount: bool,

    /// Settings file (default: ~/.mediatagger/settings.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Console log level (overrides settings)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(ConfigManager::default_path);
    let mut config = ConfigManager::new(&config_path);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    if let Err(e) = config.ensure_dirs_exist() {
        eprintln!("Warning: could not create working folders: {}", e);
    }

    let mut settings = config.settings().clone();
    if args.preview {
        settings.analysis.preview = true;
    }

    let logs_folder = settings.paths.logs_folder();
    let level = args.log_level.unwrap_or(settings.logging.level);
    let _guard = init_tracing(level, Some(logs_folder.as_path()));

    let marker = VersionMarker::new(settings.paths.version_marker());
    let current = mediatag_core::version();
    if marker.should_show_notice(current) {
        println!("Media Tagger {} - see the changelog for what's new.", current);
        if let Err(e) = marker.record(current) {
            tracing::warn!("Could not record version marker: {}", e);
        }
    }

    let request = build_request(&args)?;

    let log_config = settings.logging.to_log_config();
    let logger = match RunLogger::create("media-tagger", &logs_folder, log_config.clone(), None) {
        Ok(logger) => logger,
        Err(e) => {
            tracing::warn!("Run log unavailable ({}), logging to console only", e);
            RunLogger::detached("media-tagger", log_config, None)
        }
    };
    let session = TaggingSession::new(settings, Arc::new(logger));

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let (tx, rx) = mpsc::channel();

    let printer = std::thread::spawn(move || render_events(rx));
    let mut worker = tokio::task::spawn_blocking(move || {
        session.run(&request, &mut AcceptAll, &worker_cancel, &tx)
    });

    let joined = tokio::select! {
        res = &mut worker => res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nCancelling...");
            cancel.cancel();
            worker.await
        }
    };
    let _ = printer.join();

    match joined.context("Worker thread panicked")?? {
        SessionOutcome::Cancelled => {
            println!("Cancelled. No files were changed.");
            Ok(ExitCode::from(130))
        }
        SessionOutcome::Completed(summary) => {
            print_summary(&summary);
            Ok(if summary.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn build_request(args: &Args) -> Result<TaggingRequest> {
    let found = collect_media(&args.paths);
    for path in &found.unsupported {
        eprintln!("Skipping unsupported file {}", path.display());
    }
    if let Some(missing) = found.missing.first() {
        bail!("No such file or folder: {}", missing.display());
    }

    let mut tags = TagSet::new();
    for input in &args.tags {
        tags.add_input(input);
    }

    let date = args.date.unwrap_or_else(CaptureDate::today);
    let mut request = TaggingRequest::new(found.items, tags, date);

    request.location = match (&args.lat, &args.lon) {
        (Some(lat), Some(lon)) => Some(Location::new(
            args.location_name.clone().unwrap_or_default(),
            lat.clone(),
            lon.clone(),
        )),
        (None, None) => None,
        _ => bail!("--lat and --lon must be given together"),
    };
    request.review = ReviewFlags {
        legal: args.legal,
        safety: args.safety,
    };
    request.transcribe = args.transcribe;
    request.copy = args.copy;
    request.projects = match args.project {
        Some(ref name) => ProjectAssignment::with_default(name.clone()),
        None => ProjectAssignment::new(),
    };
    request.allow_mount = !args.no_mount;
    Ok(request)
}

fn render_events(rx: mpsc::Receiver<SessionEvent>) {
    let mut last_percent = None;
    for event in rx {
        match event {
            SessionEvent::Phase(name) => {
                last_percent = None;
                println!("=== {} ===", name);
            }
            SessionEvent::Analysis(update) => {
                let pct = update.overall_percent as u32;
                if last_percent != Some(pct) {
                    last_percent = Some(pct);
                    println!(
                        "[{:>3}%] video {}/{} {} ({})",
                        pct,
                        update.video_index + 1,
                        update.video_count,
                        update.file_name,
                        update.stage
                    );
                }
            }
            SessionEvent::Embedded {
                index,
                count,
                file_name,
            } => println!("Embedded {} of {}: {}", index, count, file_name),
            SessionEvent::Copy(progress) => {
                let pct = progress.percent() as u32;
                if last_percent != Some(pct) {
                    last_percent = Some(pct);
                    println!("[{:>3}%] copying {}", pct, progress.file_name);
                }
            }
            SessionEvent::Warning(message) => eprintln!("[WARNING] {}", message),
            SessionEvent::ItemFailed { file, message } => {
                eprintln!("[FAILED] {}: {}", file.display(), message)
            }
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    println!();
    for placed in &summary.routing.placed {
        println!("  {} -> {}", placed.original.display(), placed.destination.display());
    }
    for sidecar in &summary.sidecars {
        println!("  transcript {}", sidecar.display());
    }
    if summary.routing.used_fallback {
        println!("Network share unavailable; files were kept next to the originals.");
    }
    println!(
        "{} file(s) placed, {} analysis failure(s), {} embedding failure(s), {} copy failure(s)",
        summary.placed_count(),
        summary.analysis_failures.len(),
        summary.embed_failures.len(),
        summary.routing.failures.len()
    );
}
