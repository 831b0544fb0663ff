//! Configuration file handling for ~/.geoguard/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::service::ServiceConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.geoguard/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.geoguard/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = self.to_config_string();
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render as a commented INI document.
    pub fn to_config_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Build the runtime service configuration from these settings.
    pub fn service_config(&self) -> ServiceConfig {
        let mut builder = ServiceConfig::builder()
            .check_interval(Duration::from_millis(self.monitor.check_interval_ms))
            .dwell_threshold(Duration::from_millis(self.monitor.dwell_threshold_ms))
            .dwell_check_interval(Duration::from_millis(self.monitor.dwell_check_interval_ms))
            .event_log_capacity(self.monitor.event_log_capacity)
            .event_channel_capacity(self.monitor.event_channel_capacity)
            .max_retry_attempts(self.location.max_retry_attempts)
            .wait_timeout(Duration::from_secs(self.location.wait_timeout_secs));

        if let Some(fallback) = self.location.fallback {
            builder = builder.fallback_location(fallback);
        }

        builder.build()
    }
}

/// Get the path to the config directory (~/.geoguard).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geoguard")
}

/// Get the path to the config file (~/.geoguard/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
