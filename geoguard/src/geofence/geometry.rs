//! Geometry evaluator - containment, boundary distance and validation.
//!
//! # Conventions
//!
//! - Circles use great-circle (haversine) distance and are boundary
//!   inclusive: a point exactly `radius` meters away is inside.
//! - Polygons are evaluated with the even-odd ray casting rule on
//!   (longitude, latitude) treated as planar coordinates. This is only sound
//!   for regions small enough that planar distortion is negligible, and never
//!   for polygons crossing the antimeridian or containing a pole.
//! - Polygons are boundary inclusive too: a point on an edge or vertex is
//!   inside. Ray casting alone classifies edge points inconsistently
//!   (depending on which side the edge faces), so edges are tested first.

use crate::coord::{distance_meters, project_local, CoordError, Coordinate};

use super::types::{Geofence, GeofenceError, GeofenceShape};

/// Tolerance in degrees for on-edge tests (~0.1 mm).
const EDGE_EPSILON_DEG: f64 = 1e-9;

/// Returns true if `point` is within `radius_meters` of `center`.
pub fn is_point_in_circle(point: &Coordinate, center: &Coordinate, radius_meters: f64) -> bool {
    distance_meters(point, center) <= radius_meters
}

/// Returns true if `point` is inside or on the boundary of the polygon.
///
/// Fewer than three vertices never contain anything.
pub fn is_point_in_polygon(point: &Coordinate, vertices: &[Coordinate]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let x = point.longitude;
    let y = point.latitude;
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].longitude, vertices[i].latitude);
        let (xj, yj) = (vertices[j].longitude, vertices[j].latitude);

        if is_on_segment(x, y, xi, yi, xj, yj) {
            return true;
        }

        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// Planar test for `(px, py)` lying on segment `a`-`b` within tolerance.
fn is_on_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> bool {
    if px < ax.min(bx) - EDGE_EPSILON_DEG
        || px > ax.max(bx) + EDGE_EPSILON_DEG
        || py < ay.min(by) - EDGE_EPSILON_DEG
        || py > ay.max(by) + EDGE_EPSILON_DEG
    {
        return false;
    }

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    let length = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
    cross.abs() <= EDGE_EPSILON_DEG * length.max(1.0)
}

/// Returns true if the geofence's region contains `point`.
pub fn contains(geofence: &Geofence, point: &Coordinate) -> bool {
    match &geofence.shape {
        GeofenceShape::Circle {
            center,
            radius_meters,
        } => is_point_in_circle(point, center, *radius_meters),
        GeofenceShape::Polygon { vertices } => is_point_in_polygon(point, vertices),
    }
}

/// Unsigned distance in meters from `point` to the geofence boundary.
///
/// Used to annotate events; membership never depends on it.
pub fn distance_to_geofence(point: &Coordinate, geofence: &Geofence) -> f64 {
    match &geofence.shape {
        GeofenceShape::Circle {
            center,
            radius_meters,
        } => (distance_meters(point, center) - radius_meters).abs(),
        GeofenceShape::Polygon { vertices } => distance_to_polygon_boundary(point, vertices),
    }
}

/// Minimum point-to-edge distance over all edges, closing edge included.
fn distance_to_polygon_boundary(point: &Coordinate, vertices: &[Coordinate]) -> f64 {
    if vertices.is_empty() {
        return f64::INFINITY;
    }

    let projected: Vec<(f64, f64)> = vertices
        .iter()
        .map(|v| project_local(point, v))
        .collect();

    let mut min = f64::INFINITY;
    let mut j = projected.len() - 1;
    for i in 0..projected.len() {
        min = min.min(origin_to_segment(projected[j], projected[i]));
        j = i;
    }
    min
}

/// Distance from the origin to segment `a`-`b` in the local plane.
fn origin_to_segment(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a.0.hypot(a.1);
    }

    let t = (-(a.0 * dx + a.1 * dy) / len_sq).clamp(0.0, 1.0);
    (a.0 + t * dx).hypot(a.1 + t * dy)
}

/// Check a geofence definition.
///
/// - id must be non-empty
/// - circle: finite radius > 0 and a valid center
/// - polygon: at least 3 valid vertices, no two consecutive duplicates
pub fn validate_geofence(geofence: &Geofence) -> Result<(), GeofenceError> {
    if geofence.id.trim().is_empty() {
        return Err(GeofenceError::EmptyId);
    }

    match &geofence.shape {
        GeofenceShape::Circle {
            center,
            radius_meters,
        } => {
            check_coordinate(center)?;
            if !radius_meters.is_finite() || *radius_meters <= 0.0 {
                return Err(GeofenceError::InvalidRadius(*radius_meters));
            }
        }
        GeofenceShape::Polygon { vertices } => {
            if vertices.len() < 3 {
                return Err(GeofenceError::TooFewVertices(vertices.len()));
            }
            for vertex in vertices {
                check_coordinate(vertex)?;
            }
            if let Some(index) = vertices.windows(2).position(|pair| pair[0] == pair[1]) {
                return Err(GeofenceError::DuplicateVertex { index });
            }
        }
    }

    Ok(())
}

/// Boolean form of [`validate_geofence`].
pub fn is_valid_geofence(geofence: &Geofence) -> bool {
    validate_geofence(geofence).is_ok()
}

fn check_coordinate(coordinate: &Coordinate) -> Result<(), CoordError> {
    Coordinate::new(coordinate.latitude, coordinate.longitude).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    /// 1°x1° square with its south-west corner on the equator/prime meridian.
    fn unit_square() -> Vec<Coordinate> {
        vec![
            coord(0.0, 0.0),
            coord(0.0, 1.0),
            coord(1.0, 1.0),
            coord(1.0, 0.0),
        ]
    }

    #[test]
    fn test_circle_contains_center() {
        let center = coord(40.7128, -74.0060);
        assert!(is_point_in_circle(&center, &center, 100.0));
    }

    #[test]
    fn test_circle_nearby_point_inside() {
        let center = coord(40.7128, -74.0060);
        assert!(is_point_in_circle(
            &coord(40.71285, -74.00605),
            &center,
            100.0
        ));
    }

    #[test]
    fn test_circle_far_point_outside() {
        let center = coord(40.7128, -74.0060);
        assert!(!is_point_in_circle(&coord(40.72, -74.10), &center, 100.0));
    }

    #[test]
    fn test_circle_boundary_inclusive() {
        let center = coord(10.0, 20.0);
        let point = coord(10.001, 20.0);
        let d = distance_meters(&point, &center);

        assert!(is_point_in_circle(&point, &center, d));
        assert!(!is_point_in_circle(&point, &center, d - 1e-6));
    }

    #[test]
    fn test_polygon_interior_and_exterior() {
        let square = unit_square();
        assert!(is_point_in_polygon(&coord(0.5, 0.5), &square));
        assert!(!is_point_in_polygon(&coord(1.5, 0.5), &square));
        assert!(!is_point_in_polygon(&coord(0.5, -0.5), &square));
        assert!(!is_point_in_polygon(&coord(-0.001, -0.001), &square));
    }

    #[test]
    fn test_polygon_edges_and_vertices_are_inside() {
        let square = unit_square();
        // Every edge, whichever way it faces
        assert!(is_point_in_polygon(&coord(0.0, 0.5), &square));
        assert!(is_point_in_polygon(&coord(1.0, 0.5), &square));
        assert!(is_point_in_polygon(&coord(0.5, 0.0), &square));
        assert!(is_point_in_polygon(&coord(0.5, 1.0), &square));
        // Vertices
        assert!(is_point_in_polygon(&coord(0.0, 0.0), &square));
        assert!(is_point_in_polygon(&coord(1.0, 1.0), &square));
    }

    #[test]
    fn test_polygon_concave() {
        // L-shape: the north-east quadrant is cut out
        let l_shape = vec![
            coord(0.0, 0.0),
            coord(0.0, 2.0),
            coord(1.0, 2.0),
            coord(1.0, 1.0),
            coord(2.0, 1.0),
            coord(2.0, 0.0),
        ];
        assert!(is_point_in_polygon(&coord(0.5, 1.5), &l_shape));
        assert!(is_point_in_polygon(&coord(1.5, 0.5), &l_shape));
        assert!(!is_point_in_polygon(&coord(1.5, 1.5), &l_shape));
    }

    #[test]
    fn test_polygon_vertex_order_irrelevant() {
        let mut square = unit_square();
        square.reverse();
        assert!(is_point_in_polygon(&coord(0.5, 0.5), &square));
        assert!(!is_point_in_polygon(&coord(1.5, 0.5), &square));
    }

    #[test]
    fn test_polygon_too_few_vertices_contains_nothing() {
        let line = vec![coord(0.0, 0.0), coord(1.0, 1.0)];
        assert!(!is_point_in_polygon(&coord(0.5, 0.5), &line));
    }

    #[test]
    fn test_distance_to_circle_boundary() {
        let center = coord(0.0, 0.0);
        let fence = Geofence::circle("c", "Circle", center, 1000.0);

        // At the center: one full radius from the edge
        assert!((distance_to_geofence(&center, &fence) - 1000.0).abs() < 1e-6);

        // Outside: distance minus radius
        let outside = coord(0.0, 0.1);
        let expected = distance_meters(&outside, &center) - 1000.0;
        assert!((distance_to_geofence(&outside, &fence) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_polygon_boundary() {
        let fence = Geofence::polygon("p", "Square", unit_square());

        // Center of the square is half a degree from every edge (~55.6 km)
        let d = distance_to_geofence(&coord(0.5, 0.5), &fence);
        assert!((d - 55_597.0).abs() < 100.0, "got {d}");

        // On an edge
        let d = distance_to_geofence(&coord(0.0, 0.5), &fence);
        assert!(d < 0.01, "got {d}");

        // Outside, nearest to a vertex
        let d = distance_to_geofence(&coord(-0.001, -0.001), &fence);
        assert!((d - 157.25).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_to_polygon_includes_closing_edge() {
        // Closing edge runs along longitude 0 from (1,0) back to (0,0)
        let fence = Geofence::polygon("p", "Square", unit_square());
        let d = distance_to_geofence(&coord(0.5, -0.001), &fence);
        assert!((d - 111.2).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_contains_dispatch() {
        let circle = Geofence::circle("c", "Circle", coord(0.0, 0.0), 10.0);
        let square = Geofence::polygon("p", "Square", unit_square());

        assert!(contains(&circle, &coord(0.0, 0.0)));
        assert!(!contains(&circle, &coord(0.5, 0.5)));
        assert!(contains(&square, &coord(0.5, 0.5)));
    }

    #[test]
    fn test_validate_circle() {
        let ok = Geofence::circle("home", "Home", coord(0.0, 0.0), 100.0);
        assert!(validate_geofence(&ok).is_ok());
        assert!(is_valid_geofence(&ok));

        let zero = Geofence::circle("home", "Home", coord(0.0, 0.0), 0.0);
        assert_eq!(
            validate_geofence(&zero),
            Err(GeofenceError::InvalidRadius(0.0))
        );

        let negative = Geofence::circle("home", "Home", coord(0.0, 0.0), -5.0);
        assert!(!is_valid_geofence(&negative));

        let nan = Geofence::circle("home", "Home", coord(0.0, 0.0), f64::NAN);
        assert!(!is_valid_geofence(&nan));
    }

    #[test]
    fn test_validate_polygon() {
        assert!(is_valid_geofence(&Geofence::polygon(
            "p",
            "Square",
            unit_square()
        )));

        let two = Geofence::polygon("p", "Line", vec![coord(0.0, 0.0), coord(1.0, 1.0)]);
        assert_eq!(
            validate_geofence(&two),
            Err(GeofenceError::TooFewVertices(2))
        );

        let duplicate = Geofence::polygon(
            "p",
            "Dup",
            vec![
                coord(0.0, 0.0),
                coord(0.0, 1.0),
                coord(0.0, 1.0),
                coord(1.0, 1.0),
            ],
        );
        assert_eq!(
            validate_geofence(&duplicate),
            Err(GeofenceError::DuplicateVertex { index: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let fence = Geofence::circle("  ", "Blank", coord(0.0, 0.0), 10.0);
        assert_eq!(validate_geofence(&fence), Err(GeofenceError::EmptyId));
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let bad_center = Coordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        let fence = Geofence::circle("c", "Bad", bad_center, 10.0);
        assert!(matches!(
            validate_geofence(&fence),
            Err(GeofenceError::InvalidCoordinate(CoordError::InvalidLatitude(_)))
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GeofenceError::DuplicateVertex { index: 2 }.to_string(),
            "Polygon vertices 2 and 3 are identical"
        );
        assert_eq!(
            GeofenceError::TooFewVertices(1).to_string(),
            "Polygon needs at least 3 vertices (got 1)"
        );
    }
}
