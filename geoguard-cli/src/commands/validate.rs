//! Validate command - report which configured geofences would be accepted.

use std::fmt::Write as _;

use geoguard::geofence::Geofence;
use geoguard::monitor::{GeofenceMonitor, ValidationReport};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the validate command.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("validate");

    let config = runner.config();
    let mut monitor = GeofenceMonitor::with_config(config.service_config().monitor().clone());
    let report = monitor.register(config.geofences.clone());

    print!("{}", format_report(&config.geofences, &report));
    Ok(())
}

/// Render a registration report, one line per geofence in config order.
pub(crate) fn format_report(geofences: &[Geofence], report: &ValidationReport) -> String {
    let mut out = String::new();

    if geofences.is_empty() {
        out.push_str("No geofences configured.\n");
        return out;
    }

    let _ = writeln!(
        out,
        "Geofences: {} accepted, {} rejected",
        report.accepted.len(),
        report.rejected.len()
    );
    out.push('\n');

    let mut rejected = report.rejected.iter();
    for geofence in geofences {
        if report.accepted.contains(&geofence.id) {
            let _ = writeln!(out, "  ✓ {}", geofence);
        } else if let Some(rejection) = rejected.next() {
            let _ = writeln!(out, "  ✗ {}: {}", geofence, rejection.reason);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoguard::coord::Coordinate;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_report_lists_accepted_and_rejected() {
        let geofences = vec![
            Geofence::circle("home", "Home", coord(40.7128, -74.006), 100.0),
            Geofence::circle("bad", "Bad", coord(0.0, 0.0), -5.0),
        ];
        let report = GeofenceMonitor::new().register(geofences.clone());

        let out = format_report(&geofences, &report);

        assert!(out.starts_with("Geofences: 1 accepted, 1 rejected"));
        assert!(out.contains("✓ home (Home, circle)"));
        assert!(out.contains("✗ bad (Bad, circle): Circle radius must be a positive number"));
    }

    #[test]
    fn test_report_without_geofences() {
        let out = format_report(&[], &ValidationReport::default());
        assert_eq!(out, "No geofences configured.\n");
    }
}
