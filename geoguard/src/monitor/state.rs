//! Per-geofence visit state.

use std::time::{Duration, Instant};

/// State of a geofence the device is currently inside.
///
/// Exists only while INSIDE: created on entry, dropped on exit.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceState {
    pub geofence_id: String,

    /// When the current visit began.
    pub entered_at: Instant,

    /// Last evaluation that touched this visit.
    pub last_update: Instant,

    /// `last_update - entered_at`.
    pub dwell_time: Duration,

    /// Whether the dwell event for this visit has fired.
    pub dwell_emitted: bool,
}

impl GeofenceState {
    /// Start a visit at `now`.
    pub fn entered(geofence_id: impl Into<String>, now: Instant) -> Self {
        Self {
            geofence_id: geofence_id.into(),
            entered_at: now,
            last_update: now,
            dwell_time: Duration::ZERO,
            dwell_emitted: false,
        }
    }

    /// Refresh the visit at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_update = now;
        self.dwell_time = now.saturating_duration_since(self.entered_at);
    }

    /// Dwell time as of `now`, without recording an update.
    pub fn dwell_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_updates_dwell() {
        let start = Instant::now();
        let mut state = GeofenceState::entered("home", start);
        assert_eq!(state.dwell_time, Duration::ZERO);

        state.touch(start + Duration::from_secs(30));

        assert_eq!(state.dwell_time, Duration::from_secs(30));
        assert_eq!(state.last_update, start + Duration::from_secs(30));
        assert_eq!(state.dwell_at(start + Duration::from_secs(45)), Duration::from_secs(45));
    }
}
