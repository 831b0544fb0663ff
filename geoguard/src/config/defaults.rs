//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;

/// Default membership fallback interval (5 seconds).
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 5_000;

/// Default dwell threshold (60 seconds).
pub const DEFAULT_DWELL_THRESHOLD_MS: u64 = 60_000;

/// Default dwell timer interval (1 second).
pub const DEFAULT_DWELL_CHECK_INTERVAL_MS: u64 = 1_000;

/// Default number of retained events.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

/// Default broadcast channel capacity.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default consecutive-failure bound.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default wait timeout (10 seconds).
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;

/// Default log file name, inside `<config dir>/logs`.
pub const DEFAULT_LOG_FILE_NAME: &str = "geoguard.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            monitor: MonitorSettings {
                check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
                dwell_threshold_ms: DEFAULT_DWELL_THRESHOLD_MS,
                dwell_check_interval_ms: DEFAULT_DWELL_CHECK_INTERVAL_MS,
                event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
                event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            },
            location: LocationSettings {
                max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
                wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
                fallback: None,
            },
            logging: LoggingSettings {
                file: config_directory()
                    .join("logs")
                    .join(DEFAULT_LOG_FILE_NAME),
            },
            geofences: Vec::new(),
        }
    }
}
