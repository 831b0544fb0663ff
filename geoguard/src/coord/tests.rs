//! Tests for coordinates and distance

use super::*;

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

#[test]
fn test_valid_coordinate() {
    let c = Coordinate::new(40.7128, -74.0060).unwrap();
    assert_eq!(c.latitude, 40.7128);
    assert_eq!(c.longitude, -74.0060);
    assert!(c.is_valid());
}

#[test]
fn test_range_edges_are_valid() {
    assert!(Coordinate::new(90.0, 180.0).is_ok());
    assert!(Coordinate::new(-90.0, -180.0).is_ok());
}

#[test]
fn test_invalid_latitude() {
    assert_eq!(
        Coordinate::new(90.5, 0.0),
        Err(CoordError::InvalidLatitude(90.5))
    );
    assert!(Coordinate::new(f64::NAN, 0.0).is_err());
}

#[test]
fn test_invalid_longitude() {
    assert_eq!(
        Coordinate::new(0.0, -180.1),
        Err(CoordError::InvalidLongitude(-180.1))
    );
    assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn test_struct_literal_validity() {
    let bad = Coordinate {
        latitude: 123.0,
        longitude: 0.0,
    };
    assert!(!bad.is_valid());
}

#[test]
fn test_parse_coordinate() {
    let c: Coordinate = "40.7128, -74.0060".parse().unwrap();
    assert_eq!(c, coord(40.7128, -74.0060));

    let c: Coordinate = "1.5,2.5".parse().unwrap();
    assert_eq!(c, coord(1.5, 2.5));
}

#[test]
fn test_parse_coordinate_errors() {
    assert!(matches!(
        "40.7128".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "north, west".parse::<Coordinate>(),
        Err(CoordError::Malformed(_))
    ));
    assert!(matches!(
        "95.0, 0.0".parse::<Coordinate>(),
        Err(CoordError::InvalidLatitude(_))
    ));
}

#[test]
fn test_distance_zero() {
    let c = coord(40.7128, -74.0060);
    assert_eq!(distance_meters(&c, &c), 0.0);
}

#[test]
fn test_distance_one_degree_longitude_at_equator() {
    let d = distance_meters(&coord(0.0, 0.0), &coord(0.0, 1.0));
    assert!((d - 111_195.0).abs() < 10.0, "got {d}");
}

#[test]
fn test_distance_is_symmetric() {
    let a = coord(40.7128, -74.0060);
    let b = coord(51.5074, -0.1278);
    let ab = distance_meters(&a, &b);
    let ba = distance_meters(&b, &a);
    assert!((ab - ba).abs() < 1e-6);
    // New York to London is roughly 5570 km
    assert!((ab - 5_570_000.0).abs() < 20_000.0, "got {ab}");
}

#[test]
fn test_distance_antipodal_does_not_nan() {
    let d = distance_meters(&coord(0.0, 0.0), &coord(0.0, 180.0));
    assert!(d.is_finite());
    assert!((d - PI * EARTH_RADIUS_M).abs() < 1.0);
}

#[test]
fn test_project_local_axes() {
    let origin = coord(0.0, 0.0);
    let (x, y) = project_local(&origin, &coord(0.0, 0.001));
    assert!((x - 111.195).abs() < 0.01);
    assert!(y.abs() < 1e-9);

    let (x, y) = project_local(&origin, &coord(0.001, 0.0));
    assert!(x.abs() < 1e-9);
    assert!((y - 111.195).abs() < 0.01);
}
