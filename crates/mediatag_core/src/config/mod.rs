//! Configuration management for Media Tagger.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is rewritten)
//! - The last-seen version marker
//!
//! # Example
//!
//! ```no_run
//! use mediatag_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(ConfigManager::default_path());
//! config.load_or_create().unwrap();
//!
//! println!("Mount: {}", config.settings().network.mount_path);
//!
//! config.settings_mut().embedding.replace_original = true;
//! config.update_section(ConfigSection::Embedding).unwrap();
//! ```

mod manager;
mod settings;
mod version;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    expand_home, AnalysisSettings, ConfigSection, EmbeddingSettings, LoggingSettings,
    NetworkSettings, PathSettings, Settings, ToolSettings,
};
pub use version::VersionMarker;
