//! Geofence transition events.

use std::fmt;
use std::time::Instant;

use crate::coord::Coordinate;
use crate::geofence::Metadata;

/// Kind of geofence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeofenceEventKind {
    /// The device crossed from outside to inside.
    Enter,
    /// The device crossed from inside to outside.
    Exit,
    /// The device stayed inside for the dwell threshold.
    Dwell,
}

impl fmt::Display for GeofenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => write!(f, "enter"),
            Self::Exit => write!(f, "exit"),
            Self::Dwell => write!(f, "dwell"),
        }
    }
}

/// An emitted geofence transition.
///
/// Events are immutable once created. `distance_to_boundary` is an unsigned
/// annotation in meters; it does not drive any decision.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceEvent {
    pub geofence_id: String,
    pub geofence_name: String,
    pub kind: GeofenceEventKind,
    pub coordinate: Coordinate,
    pub timestamp: Instant,
    pub distance_to_boundary: f64,
    pub metadata: Metadata,
}

impl fmt::Display for GeofenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) at {} [{:.1} m from boundary]",
            self.kind, self.geofence_id, self.geofence_name, self.coordinate, self.distance_to_boundary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        let event = GeofenceEvent {
            geofence_id: "home".to_string(),
            geofence_name: "Home".to_string(),
            kind: GeofenceEventKind::Enter,
            coordinate: Coordinate::new(1.5, -2.25).unwrap(),
            timestamp: Instant::now(),
            distance_to_boundary: 12.345,
            metadata: Metadata::new(),
        };

        assert_eq!(
            event.to_string(),
            "enter home (Home) at 1.500000, -2.250000 [12.3 m from boundary]"
        );
    }
}
