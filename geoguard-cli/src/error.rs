//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use geoguard::config::ConfigFileError;
use geoguard::coord::CoordError;
use geoguard::replay::TrackError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// `init` would overwrite an existing file
    ConfigExists(PathBuf),
    /// Coordinate given on the command line is out of range
    Coordinate(CoordError),
    /// Track file could not be loaded
    Track { path: PathBuf, error: TrackError },
    /// Failed to build the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to overwrite it with the defaults.");
            }
            CliError::Track { .. } => {
                eprintln!();
                eprintln!("Track lines look like:");
                eprintln!("  10000,40.7128,-74.0060");
                eprintln!("  15000,error,GPS signal lost");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::ConfigExists(path) => {
                write!(f, "Configuration file already exists: {}", path.display())
            }
            CliError::Coordinate(e) => write!(f, "Invalid coordinate: {}", e),
            CliError::Track { path, error } => {
                write!(f, "Failed to load track '{}': {}", path.display(), error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Coordinate(e) => Some(e),
            CliError::Track { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinate(e)
    }
}
