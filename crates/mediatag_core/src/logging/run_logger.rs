//! Per-run logger with file and callback output.
//!
//! One tagging run gets one logger that writes a dedicated log file,
//! forwards every line to an optional UI callback, mirrors it into
//! `tracing`, and keeps a tail of subprocess output for failure reports.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

pub struct RunLogger {
    run_name: String,
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress value written (compact-mode filtering).
    last_progress: Mutex<Option<u32>>,
}

impl RunLogger {
    /// Create a logger writing to `<log_dir>/<run_name>_<timestamp>.log`.
    pub fn create(
        run_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_name = run_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("{}_{}.log", sanitize_filename(&run_name), stamp));
        let file = File::create(&log_path)?;

        let mut logger = Self::detached(run_name, config, callback);
        logger.log_path = Some(log_path);
        logger.file_writer = Mutex::new(Some(BufWriter::new(file)));
        Ok(logger)
    }

    /// Create a logger without a log file (callback and tracing only).
    pub fn detached(
        run_name: impl Into<String>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> Self {
        let tail_capacity = config.error_tail;
        Self {
            run_name: run_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            callback: Mutex::new(callback),
            config,
            tail_buffer: Mutex::new(VecDeque::with_capacity(tail_capacity)),
            last_progress: Mutex::new(None),
        }
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        match level {
            LogLevel::Trace => tracing::trace!(run = %self.run_name, "{}", message),
            LogLevel::Debug => tracing::debug!(run = %self.run_name, "{}", message),
            LogLevel::Info => tracing::info!(run = %self.run_name, "{}", message),
            LogLevel::Warn => tracing::warn!(run = %self.run_name, "{}", message),
            LogLevel::Error => tracing::error!(run = %self.run_name, "{}", message),
        }
        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a command line about to be executed.
    pub fn command(&self, cmd: &std::process::Command) {
        self.command_masked(cmd, &[]);
    }

    /// Log a command line with arguments equal to any of `secrets` masked.
    pub fn command_masked(&self, cmd: &std::process::Command, secrets: &[&str]) {
        let mut line = cmd.get_program().to_string_lossy().to_string();
        for arg in cmd.get_args() {
            let arg = arg.to_string_lossy();
            line.push(' ');
            if secrets.iter().any(|s| !s.is_empty() && *s == arg) {
                line.push_str("***");
            } else {
                line.push_str(&shell_quote(&arg));
            }
        }
        self.log(LogLevel::Info, &MessagePrefix::Command.format(&line));
    }

    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log overall progress (filtered in compact mode).
    ///
    /// Returns true if the value was written.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);
            if let Some(prev) = *last {
                if percent / step <= prev / step && percent < 100 {
                    return false;
                }
                if prev >= 100 {
                    return false;
                }
            }
            *last = Some(percent);
        }

        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Record one line of subprocess output.
    ///
    /// Always kept in the tail buffer; written out only when not compact.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 {
                if buffer.len() >= self.config.error_tail {
                    buffer.pop_front();
                }
                buffer.push_back(line.to_string());
            }
        }

        if self.config.compact {
            return;
        }
        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.log(LogLevel::Debug, &format!("{}{}", prefix, line));
    }

    /// Write out the tail buffer, typically after a failure.
    pub fn show_tail(&self, header: &str) {
        let lines: Vec<String> = self.tail_buffer.lock().iter().cloned().collect();
        if lines.is_empty() {
            return;
        }
        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in &lines {
            self.output(&self.format_message(line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RunLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLogger")
            .field("run_name", &self.run_name)
            .field("log_path", &self.log_path)
            .finish_non_exhaustive()
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}

fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
