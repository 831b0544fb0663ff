//! Service configuration types.

use std::time::Duration;

use crate::coord::Coordinate;
use crate::location::ReliabilityConfig;
use crate::monitor::{MonitorConfig, DEFAULT_EVENT_CHANNEL_CAPACITY};

/// Default fallback interval for membership evaluation.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Default interval of the dwell timer.
pub const DEFAULT_DWELL_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Per-start overrides accepted by [`GeofenceService::start`](super::GeofenceService::start).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Membership fallback interval (default: service configuration).
    pub check_interval: Option<Duration>,

    /// Dwell threshold (default: service configuration).
    pub dwell_threshold: Option<Duration>,
}

/// Configuration for the geofence service.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use geoguard::service::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .check_interval(Duration::from_secs(2))
///     .max_retry_attempts(5)
///     .build();
///
/// assert_eq!(config.check_interval(), Duration::from_secs(2));
/// assert_eq!(config.reliability().max_retry_attempts, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Membership fallback interval
    check_interval: Duration,
    /// Dwell timer interval
    dwell_check_interval: Duration,
    /// Broadcast channel buffer per receiver
    event_channel_capacity: usize,
    /// Monitor engine configuration
    monitor: MonitorConfig,
    /// Reliability layer configuration
    reliability: ReliabilityConfig,
}

impl ServiceConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Get the membership fallback interval.
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Get the dwell timer interval.
    pub fn dwell_check_interval(&self) -> Duration {
        self.dwell_check_interval
    }

    /// Get the broadcast channel capacity.
    pub fn event_channel_capacity(&self) -> usize {
        self.event_channel_capacity
    }

    /// Get the monitor engine configuration.
    pub fn monitor(&self) -> &MonitorConfig {
        &self.monitor
    }

    /// Get the reliability layer configuration.
    pub fn reliability(&self) -> &ReliabilityConfig {
        &self.reliability
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfigBuilder::default().build()
    }
}

/// Builder for ServiceConfig.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    check_interval: Option<Duration>,
    dwell_check_interval: Option<Duration>,
    dwell_threshold: Option<Duration>,
    event_log_capacity: Option<usize>,
    event_channel_capacity: Option<usize>,
    max_retry_attempts: Option<u32>,
    fallback_location: Option<Coordinate>,
    wait_timeout: Option<Duration>,
}

impl ServiceConfigBuilder {
    /// Set the membership fallback interval.
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = Some(interval);
        self
    }

    /// Set the dwell timer interval.
    pub fn dwell_check_interval(mut self, interval: Duration) -> Self {
        self.dwell_check_interval = Some(interval);
        self
    }

    /// Set the time inside before a dwell event.
    pub fn dwell_threshold(mut self, threshold: Duration) -> Self {
        self.dwell_threshold = Some(threshold);
        self
    }

    /// Set how many events the log retains.
    pub fn event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = Some(capacity);
        self
    }

    /// Set the broadcast channel capacity.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = Some(capacity);
        self
    }

    /// Set the consecutive-failure bound for retries.
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = Some(attempts);
        self
    }

    /// Set the static fallback coordinate.
    pub fn fallback_location(mut self, coordinate: Coordinate) -> Self {
        self.fallback_location = Some(coordinate);
        self
    }

    /// Set the default wait timeout.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Build the configuration with defaults for unset values.
    pub fn build(self) -> ServiceConfig {
        let monitor_defaults = MonitorConfig::default();
        let reliability_defaults = ReliabilityConfig::default();

        ServiceConfig {
            check_interval: self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL),
            dwell_check_interval: self
                .dwell_check_interval
                .unwrap_or(DEFAULT_DWELL_CHECK_INTERVAL),
            event_channel_capacity: self
                .event_channel_capacity
                .unwrap_or(DEFAULT_EVENT_CHANNEL_CAPACITY),
            monitor: MonitorConfig {
                dwell_threshold: self
                    .dwell_threshold
                    .unwrap_or(monitor_defaults.dwell_threshold),
                event_log_capacity: self
                    .event_log_capacity
                    .unwrap_or(monitor_defaults.event_log_capacity),
            },
            reliability: ReliabilityConfig {
                max_retry_attempts: self
                    .max_retry_attempts
                    .unwrap_or(reliability_defaults.max_retry_attempts),
                fallback_location: self.fallback_location,
                wait_timeout: self.wait_timeout.unwrap_or(reliability_defaults.wait_timeout),
            },
        }
    }
}
