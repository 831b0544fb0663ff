//! Health snapshot for the location layer.

use std::time::Duration;

use super::reliability::TrackingStatus;

/// Point-in-time view of the collaborator and the last fix.
///
/// Permission and GPS flags are inferred from the most recent classified
/// failure: they read `false` only while that failure is the last error
/// recorded, and flip back once any operation succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    /// Collaborator readiness probe.
    pub is_view_ready: bool,

    /// False if the last failure was a permission denial or restriction.
    pub has_permission: bool,

    /// False if the last failure was GPS being disabled.
    pub is_gps_enabled: bool,

    /// Age of the cached fresh sample, `None` before the first fix.
    pub last_location_age: Option<Duration>,

    /// Tracking lifecycle status.
    pub status: TrackingStatus,
}

impl HealthStatus {
    /// True when nothing is known to block location delivery.
    pub fn is_healthy(&self) -> bool {
        self.is_view_ready
            && self.has_permission
            && self.is_gps_enabled
            && self.status != TrackingStatus::Error
    }
}
