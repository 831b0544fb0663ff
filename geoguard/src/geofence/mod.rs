//! Geofence definitions and the geometry evaluator.
//!
//! - [`types`] - `Geofence`, `GeofenceShape`, `GeofenceError`
//! - [`geometry`] - Pure containment, distance and validation functions
//!
//! Nothing in this module holds state or performs I/O; the monitor calls into
//! it once per geofence per evaluation pass.

mod geometry;
mod types;

pub use geometry::{
    contains, distance_to_geofence, is_point_in_circle, is_point_in_polygon, is_valid_geofence,
    validate_geofence,
};
pub use types::{Geofence, GeofenceError, GeofenceShape, Metadata};
