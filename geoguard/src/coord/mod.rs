//! Geographic coordinates and great-circle distance.
//!
//! Provides the [`Coordinate`] value type shared by every other module and the
//! haversine distance used for circular containment and event annotation.

mod types;

pub use types::{Coordinate, CoordError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degrees to radians conversion factor.
pub(crate) const DEG_TO_RAD: f64 = PI / 180.0;

/// Calculate the great-circle distance between two coordinates.
///
/// Uses the haversine formula, which is well conditioned for the short
/// distances geofences work with.
///
/// # Returns
///
/// Distance in meters.
///
/// # Example
///
/// ```
/// use geoguard::coord::{distance_meters, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(1.0, 0.0).unwrap();
/// let dist = distance_meters(&a, &b);
/// assert!((dist - 111_195.0).abs() < 10.0); // 1 degree of latitude
/// ```
pub fn distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    // Haversine formula
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards against a > 1.0 from rounding on antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Projects `point` onto a local planar frame centred on `origin`.
///
/// Equirectangular approximation: x grows east, y grows north, both in
/// meters. Accurate to well under a meter for the region sizes geofences
/// cover away from the poles.
#[inline]
pub(crate) fn project_local(origin: &Coordinate, point: &Coordinate) -> (f64, f64) {
    let x = (point.longitude - origin.longitude)
        * DEG_TO_RAD
        * (origin.latitude * DEG_TO_RAD).cos()
        * EARTH_RADIUS_M;
    let y = (point.latitude - origin.latitude) * DEG_TO_RAD * EARTH_RADIUS_M;
    (x, y)
}

#[cfg(test)]
mod tests;
