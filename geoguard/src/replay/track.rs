//! Recorded location tracks.
//!
//! Format: one step per line, comma separated, offsets in milliseconds from
//! the start of the track and never decreasing.
//!
//! ```text
//! # offset_ms,lat,lon
//! 0,40.7128,-74.0060
//! 5000,error,GPS signal lost
//! 65000,40.7228,-74.0060
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::coord::Coordinate;

/// Marker in the second column for a failed fetch.
const ERROR_MARKER: &str = "error";

/// Track loading errors.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Failed to read the track file
    #[error("Failed to read track file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line
    #[error("Invalid track line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// What happened at one point of a track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackStep {
    /// The collaborator returned this fix.
    Fix(Coordinate),
    /// The collaborator failed with this message.
    Failure(String),
}

/// One timed step.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub offset: Duration,
    pub step: TrackStep,
}

/// Ordered sequence of track points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Load a track file.
    pub fn load(path: &Path) -> Result<Self, TrackError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Build a track from points already in order.
    pub fn from_points(points: Vec<TrackPoint>) -> Result<Self, TrackError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].offset < pair[0].offset {
                return Err(TrackError::Parse {
                    line: index + 2,
                    reason: "offsets must not decrease".to_string(),
                });
            }
        }
        Ok(Self { points })
    }

    /// Points in order.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Offset of the last point, zero for an empty track.
    pub fn duration(&self) -> Duration {
        self.points.last().map(|p| p.offset).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromStr for Track {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut points: Vec<TrackPoint> = Vec::new();

        for (index, raw) in s.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let point = parse_line(text).map_err(|reason| TrackError::Parse { line, reason })?;

            if let Some(previous) = points.last() {
                if point.offset < previous.offset {
                    return Err(TrackError::Parse {
                        line,
                        reason: "offsets must not decrease".to_string(),
                    });
                }
            }
            points.push(point);
        }

        Ok(Self { points })
    }
}

fn parse_line(text: &str) -> Result<TrackPoint, String> {
    let mut parts = text.splitn(3, ',');
    let offset = parts.next().unwrap_or_default().trim();
    let second = parts
        .next()
        .ok_or_else(|| "expected offset_ms,lat,lon or offset_ms,error,message".to_string())?
        .trim();
    let third = parts.next().map(str::trim);

    let offset_ms: u64 = offset
        .parse()
        .map_err(|_| format!("invalid offset '{}'", offset))?;

    let step = if second.eq_ignore_ascii_case(ERROR_MARKER) {
        TrackStep::Failure(third.unwrap_or_default().to_string())
    } else {
        let lon = third.ok_or_else(|| "missing longitude".to_string())?;
        let coordinate = format!("{}, {}", second, lon)
            .parse::<Coordinate>()
            .map_err(|e| e.to_string())?;
        TrackStep::Fix(coordinate)
    };

    Ok(TrackPoint {
        offset: Duration::from_millis(offset_ms),
        step,
    })
}
