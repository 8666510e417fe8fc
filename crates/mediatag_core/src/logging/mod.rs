//! Logging infrastructure for Media Tagger.
//!
//! This module provides:
//! - Per-run loggers with file + UI callback output
//! - Compact mode with progress filtering
//! - Tail buffer of subprocess output for failure reports
//! - Global `tracing` setup with an optional rolling file sink
//!
//! # Example
//!
//! ```no_run
//! use mediatag_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::create("batch", "/path/to/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Analysis");
//! logger.progress(40);
//! logger.success("Batch completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name of the rolling application log.
pub const APP_LOG_FILE: &str = "media-tagger.log";

/// Initialize the global tracing subscriber.
///
/// - Respects `RUST_LOG`, falling back to `default_level`
/// - Writes to stderr
/// - With `log_dir`, also writes a daily-rolling file there; keep the
///   returned guard alive for the program's lifetime so it gets flushed
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init_tracing(default_level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let (file_layer, guard) = match log_dir {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, APP_LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(file_layer)
        .try_init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_test_tracing();
        let dir = tempfile::tempdir().unwrap();
        let _guard = init_tracing(LogLevel::Info, Some(dir.path()));
        let _again = init_tracing(LogLevel::Debug, None);
    }
}
