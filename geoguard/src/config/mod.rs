//! Configuration file support.
//!
//! The user configuration lives in `~/.geoguard/config.ini`:
//!
//! - `[monitor]` - evaluation intervals, dwell threshold, event retention
//! - `[location]` - retry bound, wait timeout, static fallback
//! - `[logging]` - log file
//! - `[geofence.<id>]` - one section per geofence
//!
//! # Example
//!
//! ```no_run
//! use geoguard::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let service_config = config.service_config();
//! println!("{} geofences configured", config.geofences.len());
//! # Ok::<(), geoguard::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LocationSettings, LoggingSettings, MonitorSettings};
