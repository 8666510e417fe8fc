//! Config manager for loading, saving, and atomic updates.
//!
//! Writes always go to a sibling temp file that is then renamed over
//! the target. Section updates re-read the file and replace only one
//! table, leaving hand edits elsewhere intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages the settings file.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager for `config_path`. Nothing is read until
    /// `load()` or `load_or_create()`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Default location: `~/.mediatagger/settings.toml`.
    pub fn default_path() -> PathBuf {
        super::settings::expand_home("~/.mediatagger/settings.toml")
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file; error if it doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }
        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load config, creating it with defaults if missing.
    ///
    /// Sections missing from an existing file are filled with defaults
    /// and written back; unknown top-level tables are kept.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            self.settings = toml::from_str(&content)?;

            let doc: DocumentMut = content.parse()?;
            let missing: Vec<ConfigSection> = ConfigSection::ALL
                .into_iter()
                .filter(|s| !doc.contains_table(s.table_name()))
                .collect();
            for section in missing {
                tracing::debug!("Adding missing config section [{}]", section.table_name());
                self.update_section(section)?;
            }
        } else {
            tracing::info!("Creating default config at {}", self.config_path.display());
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Create the logs and resource directories if they don't exist.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [
            self.settings.paths.logs_folder(),
            self.settings.paths.resource_dir(),
        ] {
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one section on disk from the in-memory settings.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.trim().is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let section_doc: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let s = &self.settings;
        let out = match section {
            ConfigSection::Paths => toml::to_string_pretty(&s.paths)?,
            ConfigSection::Tools => toml::to_string_pretty(&s.tools)?,
            ConfigSection::Network => toml::to_string_pretty(&s.network)?,
            ConfigSection::Embedding => toml::to_string_pretty(&s.embedding)?,
            ConfigSection::Analysis => toml::to_string_pretty(&s.analysis)?,
            ConfigSection::Logging => toml::to_string_pretty(&s.logging)?,
        };
        Ok(out)
    }

    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# Media Tagger Configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n\n",
        );

        for section in ConfigSection::ALL {
            output.push_str(&format!("# {}\n", section.description()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }
        Ok(output)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}
