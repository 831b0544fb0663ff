//! CLI runner for common setup.
//!
//! Encapsulates config loading and logging initialization so command
//! handlers start from a ready [`ConfigFile`].

use std::path::{Path, PathBuf};

use tracing::info;

use geoguard::config::{config_file_path, ConfigFile};
use geoguard::logging::{init_logging, LoggingGuard, LoggingOptions};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Where the configuration was loaded from
    config_path: PathBuf,
}

impl CliRunner {
    /// Load the config and initialize logging.
    ///
    /// A missing config file yields the defaults. Log output always goes to
    /// the configured file; `logging.stdout` mirrors it to the terminal.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file, or `None` for `~/.geoguard/config.ini`
    /// * `logging` - Stdout mirroring and the debug-level override
    pub fn new(config_path: Option<&Path>, logging: LoggingOptions) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_path);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.logging.file, logging)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("GeoGuard v{}", geoguard::VERSION);
        info!(
            config = %self.config_path.display(),
            geofences = self.config.geofences.len(),
            "GeoGuard CLI: {} command",
            command
        );
    }
}

/// The explicit path, or the default config location.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}
