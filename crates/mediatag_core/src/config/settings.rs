//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//!
//! Path values are stored as strings; a leading `~` expands to the home
//! directory and relative resource names resolve against `paths.resource_dir`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::process::DEFAULT_SEARCH_DIRS;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    /// External executables and analysis resources.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Network share routing.
    #[serde(default)]
    pub network: NetworkSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Resolve a resource name: absolute paths and `~` paths stand on
    /// their own, anything else is looked up in the resource directory.
    pub fn resource_path(&self, name: &str) -> PathBuf {
        let expanded = expand_home(name);
        if expanded.is_absolute() {
            expanded
        } else {
            self.paths.resource_dir().join(expanded)
        }
    }

    /// Optional tool override: empty means "discover".
    pub fn tool_override(value: &str) -> Option<PathBuf> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(expand_home(trimmed))
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let home = || directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf());
    if path == "~" {
        if let Some(home) = home() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Locations of resources, logs and persisted markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory holding analysis scripts, face index and helper scripts.
    #[serde(default = "default_resource_dir")]
    pub resource_dir: String,

    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Single-line file holding the last version the user has seen.
    #[serde(default = "default_version_marker")]
    pub version_marker: String,
}

impl PathSettings {
    pub fn resource_dir(&self) -> PathBuf {
        expand_home(&self.resource_dir)
    }

    pub fn logs_folder(&self) -> PathBuf {
        expand_home(&self.logs_folder)
    }

    pub fn version_marker(&self) -> PathBuf {
        expand_home(&self.version_marker)
    }
}

fn default_resource_dir() -> String {
    "~/.mediatagger".to_string()
}

fn default_logs_folder() -> String {
    "~/.mediatagger/logs".to_string()
}

fn default_version_marker() -> String {
    "~/.mediatagger/last_version.txt".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            resource_dir: default_resource_dir(),
            logs_folder: default_logs_folder(),
            version_marker: default_version_marker(),
        }
    }
}

/// External tools and the resources passed to them.
///
/// Empty executable paths are discovered in `search_dirs` and then `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub python: String,

    #[serde(default)]
    pub ffmpeg: String,

    #[serde(default)]
    pub ffprobe: String,

    #[serde(default = "default_face_script")]
    pub face_script: String,

    #[serde(default = "default_face_index")]
    pub face_index: String,

    #[serde(default = "default_names_database")]
    pub names_database: String,

    #[serde(default = "default_speech_script")]
    pub speech_script: String,

    /// Token handed to the speech stage for the diarization model.
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<String>,
}

impl ToolSettings {
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        self.search_dirs.iter().map(|d| expand_home(d)).collect()
    }
}

fn default_face_script() -> String {
    "video_tagger_CLI.py".to_string()
}

fn default_face_index() -> String {
    "known_faces.index".to_string()
}

fn default_names_database() -> String {
    "names.json".to_string()
}

fn default_speech_script() -> String {
    "detect_speech.py".to_string()
}

fn default_search_dirs() -> Vec<String> {
    DEFAULT_SEARCH_DIRS.iter().map(|s| s.to_string()).collect()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            python: String::new(),
            ffmpeg: String::new(),
            ffprobe: String::new(),
            face_script: default_face_script(),
            face_index: default_face_index(),
            names_database: default_names_database(),
            speech_script: default_speech_script(),
            access_token: String::new(),
            search_dirs: default_search_dirs(),
        }
    }
}

/// Network share layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Mount point whose presence means the share is reachable.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// Root of the finished-footage library (`<library>/<year>/`).
    #[serde(default = "default_finished_library")]
    pub finished_library: String,

    /// Root of the B-roll tree (`<root>/<year>/<stringouts>/<year>_<MM>_<project>/`).
    #[serde(default = "default_broll_root")]
    pub broll_root: String,

    #[serde(default = "default_stringouts_folder")]
    pub stringouts_folder: String,

    /// Helper run with no arguments when the mount is missing.
    #[serde(default = "default_mount_script")]
    pub mount_script: String,

    #[serde(default = "default_true")]
    pub attempt_mount: bool,
}

fn default_mount_path() -> String {
    "/Volumes/RunMedia".to_string()
}

fn default_finished_library() -> String {
    "/Volumes/RunMedia/XGridLibrary".to_string()
}

fn default_broll_root() -> String {
    "/Volumes/RunMedia/Production/BROLL".to_string()
}

fn default_stringouts_folder() -> String {
    "Project_Stringouts".to_string()
}

fn default_mount_script() -> String {
    "mount_server.sh".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            mount_path: default_mount_path(),
            finished_library: default_finished_library(),
            broll_root: default_broll_root(),
            stringouts_folder: default_stringouts_folder(),
            mount_script: default_mount_script(),
            attempt_mount: true,
        }
    }
}

/// Metadata embedding options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Offset used for the local-time creation date in video containers.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Local mode: swap the tagged copy over the original instead of
    /// writing a `tagged_` sibling.
    #[serde(default)]
    pub replace_original: bool,

    /// Write a `.txt` transcript next to each routed video.
    #[serde(default = "default_true")]
    pub write_sidecar: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            replace_original: false,
            write_sidecar: true,
        }
    }
}

/// Analysis stage options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Relative share of a video's progress owned by the face stage.
    #[serde(default = "default_weight")]
    pub face_weight: f64,

    #[serde(default = "default_weight")]
    pub speech_weight: f64,

    /// Ask the face tool to show its live preview window.
    #[serde(default)]
    pub preview: bool,

    /// How often the runner checks for cancellation (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,

    #[serde(default = "default_resize_width")]
    pub resize_width: u32,
}

fn default_weight() -> f64 {
    1.0
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_frame_skip() -> u32 {
    5
}

fn default_resize_width() -> u32 {
    640
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            face_weight: default_weight(),
            speech_weight: default_weight(),
            preview: false,
            poll_interval_ms: default_poll_interval_ms(),
            frame_skip: default_frame_skip(),
            resize_width: default_resize_width(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of subprocess output lines to show on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step,
            error_tail: self.error_tail as usize,
            show_timestamps: true,
        }
    }
}

/// Config sections for atomic updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Tools,
    Network,
    Embedding,
    Analysis,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Tools,
        ConfigSection::Network,
        ConfigSection::Embedding,
        ConfigSection::Analysis,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Tools => "tools",
            ConfigSection::Network => "network",
            ConfigSection::Embedding => "embedding",
            ConfigSection::Analysis => "analysis",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Resource, log and marker locations",
            ConfigSection::Tools => "External tools and analysis resources (empty = auto-detect)",
            ConfigSection::Network => "Network share routing",
            ConfigSection::Embedding => "Metadata embedding",
            ConfigSection::Analysis => "Face and speech analysis",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_settings_serializes() {
        let toml = toml::to_string_pretty(&Settings::default()).unwrap();
        for section in ConfigSection::ALL {
            assert!(toml.contains(&format!("[{}]", section.table_name())));
        }
        assert!(toml.contains("finished_library"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[network]\nmount_path = \"/mnt/share\"\n[logging]\nlevel = \"debug\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.network.mount_path, "/mnt/share");
        assert_eq!(parsed.network.stringouts_folder, "Project_Stringouts");
        assert_eq!(parsed.logging.level, LogLevel::Debug);
        assert_eq!(parsed.tools.face_index, "known_faces.index");
        assert_eq!(parsed.analysis.poll_interval_ms, 100);
    }

    #[test]
    fn resources_resolve_against_resource_dir() {
        let mut settings = Settings::default();
        settings.paths.resource_dir = "/opt/mediatagger".into();
        assert_eq!(
            settings.resource_path("names.json"),
            PathBuf::from("/opt/mediatagger/names.json")
        );
        assert_eq!(
            settings.resource_path("/elsewhere/names.json"),
            PathBuf::from("/elsewhere/names.json")
        );
        assert!(settings
            .resource_path("mount_server.sh")
            .starts_with(Path::new("/opt/mediatagger")));
    }

    #[test]
    fn tool_override_blank_means_discover() {
        assert_eq!(Settings::tool_override("  "), None);
        assert_eq!(
            Settings::tool_override("/usr/bin/ffmpeg"),
            Some(PathBuf::from("/usr/bin/ffmpeg"))
        );
    }
}
