//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// Filter directive understood by `EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("Unknown log level '{}'", other)),
        }
    }
}

/// Configuration for run logging.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to output.
    pub level: LogLevel,
    /// Compact mode: filter progress, keep subprocess output in the tail only.
    pub compact: bool,
    /// Only log progress at multiples of this percentage.
    pub progress_step: u32,
    /// Number of subprocess output lines kept for failure reports.
    pub error_tail: usize,
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Verbose configuration: every output line, fine-grained progress.
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 10,
            error_tail: 50,
            show_timestamps: true,
        }
    }
}

/// Callback receiving each formatted log line (UI sink).
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Shell command: `$ command`
    Command,
    /// Phase marker: `=== Phase ===`
    Phase,
    /// Section marker: `--- Section ---`
    Section,
    /// Success: `[SUCCESS]`
    Success,
    /// Warning: `[WARNING]`
    Warning,
    /// Error: `[ERROR]`
    Error,
    None,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Section => format!("--- {} ---", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::None => message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Debug < LogLevel::Error);
    }

    #[test]
    fn prefixes_format() {
        assert_eq!(MessagePrefix::Phase.format("Face"), "=== Face ===");
        assert_eq!(MessagePrefix::Command.format("ffmpeg -i a"), "$ ffmpeg -i a");
    }
}
