//! Locate command - containment and boundary distance for one coordinate.

use std::fmt::Write as _;

use geoguard::coord::Coordinate;
use geoguard::geofence::{contains, distance_to_geofence, validate_geofence, Geofence};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the locate command.
pub fn run(runner: &CliRunner, lat: f64, lon: f64) -> Result<(), CliError> {
    runner.log_startup("locate");

    let point = Coordinate::new(lat, lon)?;
    print!("{}", format_location(&point, &runner.config().geofences));
    Ok(())
}

/// Render where `point` sits relative to each geofence.
///
/// Invalid geofences are listed but not evaluated.
pub(crate) fn format_location(point: &Coordinate, geofences: &[Geofence]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Location: {}", point);
    out.push('\n');

    if geofences.is_empty() {
        out.push_str("No geofences configured.\n");
        return out;
    }

    for geofence in geofences {
        if let Err(reason) = validate_geofence(geofence) {
            let _ = writeln!(out, "  invalid  {} ({})", geofence, reason);
            continue;
        }

        let status = if contains(geofence, point) {
            "inside "
        } else {
            "outside"
        };
        let _ = writeln!(
            out,
            "  {}  {}  {:.1} m from boundary",
            status,
            geofence,
            distance_to_geofence(point, geofence)
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_inside_and_outside() {
        let geofences = vec![
            Geofence::circle("home", "Home", coord(40.7128, -74.006), 100.0),
            Geofence::circle("office", "Office", coord(40.7580, -73.9855), 50.0),
        ];

        let out = format_location(&coord(40.7128, -74.006), &geofences);

        assert!(out.starts_with("Location: 40.712800, -74.006000"));
        assert!(out.contains("inside   home (Home, circle)  100.0 m from boundary"));
        assert!(out.contains("outside  office (Office, circle)"));
    }

    #[test]
    fn test_invalid_geofence_is_not_evaluated() {
        let geofences = vec![Geofence::polygon(
            "tiny",
            "Tiny",
            vec![coord(0.0, 0.0), coord(0.0, 1.0)],
        )];

        let out = format_location(&coord(0.0, 0.5), &geofences);

        assert!(out.contains("invalid  tiny (Tiny, polygon)"));
        assert!(!out.contains("inside"));
    }
}
