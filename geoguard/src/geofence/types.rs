//! Geofence definition types.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::coord::{CoordError, Coordinate};

/// Opaque caller-supplied key/value data carried onto every event.
pub type Metadata = BTreeMap<String, String>;

/// Region covered by a geofence.
#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceShape {
    /// Everything within `radius_meters` (great-circle) of `center`.
    Circle {
        center: Coordinate,
        radius_meters: f64,
    },
    /// Simple polygon; the closing edge from the last vertex back to the
    /// first is implied.
    Polygon { vertices: Vec<Coordinate> },
}

impl GeofenceShape {
    /// Short lowercase name of the shape kind ("circle" or "polygon").
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Polygon { .. } => "polygon",
        }
    }
}

/// A named geographic region monitored for occupancy.
///
/// Geofences are treated as immutable once registered. Registering another
/// geofence with the same `id` replaces the previous definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    /// Unique identifier.
    pub id: String,
    /// Human-readable name, copied onto events.
    pub name: String,
    /// Region covered.
    pub shape: GeofenceShape,
    /// Caller data, copied onto events.
    pub metadata: Metadata,
}

impl Geofence {
    /// Create a circular geofence.
    pub fn circle(
        id: impl Into<String>,
        name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shape: GeofenceShape::Circle {
                center,
                radius_meters,
            },
            metadata: Metadata::new(),
        }
    }

    /// Create a polygonal geofence.
    pub fn polygon(
        id: impl Into<String>,
        name: impl Into<String>,
        vertices: Vec<Coordinate>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shape: GeofenceShape::Polygon { vertices },
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for Geofence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.id, self.name, self.shape.kind())
    }
}

/// Reasons a geofence definition is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    /// The id is empty or whitespace.
    #[error("Geofence id must not be empty")]
    EmptyId,

    /// Circle radius is zero, negative or not finite.
    #[error("Circle radius must be a positive number of meters (got {0})")]
    InvalidRadius(f64),

    /// Polygon has fewer than three vertices.
    #[error("Polygon needs at least 3 vertices (got {0})")]
    TooFewVertices(usize),

    /// Two consecutive polygon vertices are identical.
    #[error("Polygon vertices {index} and {} are identical", .index + 1)]
    DuplicateVertex { index: usize },

    /// A center or vertex lies outside the valid coordinate range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordError),
}
