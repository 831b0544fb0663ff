//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::coord::Coordinate;
use crate::geofence::Geofence;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Monitor timing and event retention
    pub monitor: MonitorSettings,
    /// Location reliability settings
    pub location: LocationSettings,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Geofences from `[geofence.<id>]` sections, in file order
    pub geofences: Vec<Geofence>,
}

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Membership fallback interval in milliseconds
    pub check_interval_ms: u64,
    /// Time inside before a dwell event, in milliseconds
    pub dwell_threshold_ms: u64,
    /// Dwell timer interval in milliseconds
    pub dwell_check_interval_ms: u64,
    /// Events retained in the log
    pub event_log_capacity: usize,
    /// Broadcast channel buffer per receiver
    pub event_channel_capacity: usize,
}

/// Location reliability configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    /// Consecutive failures before retries are refused
    pub max_retry_attempts: u32,
    /// Default wait timeout in seconds
    pub wait_timeout_secs: u64,
    /// Static fallback coordinate
    pub fallback: Option<Coordinate>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
