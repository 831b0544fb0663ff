//! Location sample types.
//!
//! - [`SampleSource`] - Where did this sample come from?
//! - [`LocationSample`] - A coordinate with its timestamp and source

use std::fmt;
use std::time::{Duration, Instant};

use crate::coord::Coordinate;
use crate::time;

/// Source of a location sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleSource {
    /// Fresh fix from the device's satellite positioning.
    Gps,
    /// Fresh fix from network positioning (cell/Wi-Fi), pushed by the host.
    Network,
    /// Replayed last known sample after a failed fetch.
    Cache,
    /// Caller-configured static coordinate after every other source failed.
    Fallback,
}

impl SampleSource {
    /// Returns true for samples that carry new information about the device
    /// position (as opposed to a replay or a static default).
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Gps | Self::Network)
    }
}

impl fmt::Display for SampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gps => write!(f, "gps"),
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A single location sample.
///
/// The `timestamp` is when the position was measured, so consumers can judge
/// freshness. A cached replay keeps the timestamp of the original fix.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    /// Measured position.
    pub coordinate: Coordinate,

    /// When the position was measured.
    pub timestamp: Instant,

    /// Where the position came from.
    pub source: SampleSource,
}

impl LocationSample {
    /// Create a sample timestamped now.
    pub fn new(coordinate: Coordinate, source: SampleSource) -> Self {
        Self::at(coordinate, source, time::now())
    }

    /// Create a sample with an explicit timestamp.
    pub fn at(coordinate: Coordinate, source: SampleSource, timestamp: Instant) -> Self {
        Self {
            coordinate,
            timestamp,
            source,
        }
    }

    /// Create a static fallback sample timestamped now.
    pub fn fallback(coordinate: Coordinate) -> Self {
        Self::new(coordinate, SampleSource::Fallback)
    }

    /// Copy of this sample marked as served from cache.
    pub fn as_cached(&self) -> Self {
        Self {
            source: SampleSource::Cache,
            ..self.clone()
        }
    }

    /// Time since the sample was measured.
    pub fn age(&self) -> Duration {
        time::now().saturating_duration_since(self.timestamp)
    }
}
