//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::fmt::Write as _;
use std::path::Path;

use super::parser::{GEOFENCE_SECTION_PREFIX, METADATA_KEY_PREFIX, VERTEX_SEPARATOR};
use super::settings::ConfigFile;
use crate::geofence::{Geofence, GeofenceShape};

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let fallback = config
        .location
        .fallback
        .map(|c| c.to_string())
        .unwrap_or_default();

    let mut out = format!(
        r#"[monitor]
; Fallback interval for membership evaluation in milliseconds (default: 5000)
; Membership is also evaluated whenever a new location sample arrives
check_interval_ms = {}
; Continuous time inside a geofence before a dwell event, in milliseconds (default: 60000)
dwell_threshold_ms = {}
; How often dwell time is checked, in milliseconds (default: 1000)
dwell_check_interval_ms = {}
; Number of events kept in the in-memory log (default: 10000)
event_log_capacity = {}
; Events buffered per subscriber before it starts lagging (default: 256)
event_channel_capacity = {}

[location]
; Consecutive failures after which retries are refused (default: 3)
max_retry_attempts = {}
; Seconds to wait for a location fix (default: 10)
wait_timeout_secs = {}
; Static coordinate used when no fresh or cached location exists
; Format: latitude, longitude (leave empty to disable)
fallback = {}

[logging]
; Log file path (cleared at the start of each session)
file = {}

; Geofences are declared one per section: [geofence.<id>]
;   name     - display name (default: the id)
;   type     - circle or polygon
;   center   - circle center: latitude, longitude
;   radius_m - circle radius in meters
;   vertices - polygon vertices: lat, lon | lat, lon | lat, lon
;   meta.*   - free-form metadata copied onto events (e.g. meta.owner = alice)
"#,
        config.monitor.check_interval_ms,
        config.monitor.dwell_threshold_ms,
        config.monitor.dwell_check_interval_ms,
        config.monitor.event_log_capacity,
        config.monitor.event_channel_capacity,
        config.location.max_retry_attempts,
        config.location.wait_timeout_secs,
        fallback,
        path_to_string(&config.logging.file),
    );

    for geofence in &config.geofences {
        out.push('\n');
        write_geofence(&mut out, geofence);
    }

    out
}

fn write_geofence(out: &mut String, geofence: &Geofence) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "[{}{}]", GEOFENCE_SECTION_PREFIX, geofence.id);
    let _ = writeln!(out, "name = {}", geofence.name);
    let _ = writeln!(out, "type = {}", geofence.shape.kind());

    match &geofence.shape {
        GeofenceShape::Circle {
            center,
            radius_meters,
        } => {
            let _ = writeln!(out, "center = {}", center);
            let _ = writeln!(out, "radius_m = {}", radius_meters);
        }
        GeofenceShape::Polygon { vertices } => {
            let joined = vertices
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(&format!(" {} ", VERTEX_SEPARATOR));
            let _ = writeln!(out, "vertices = {}", joined);
        }
    }

    for (key, value) in &geofence.metadata {
        let _ = writeln!(out, "{}{} = {}", METADATA_KEY_PREFIX, key, value);
    }
}

/// Render a path, abbreviating the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::defaults::*;
    use super::super::settings::ConfigFile;
    use crate::coord::Coordinate;
    use crate::geofence::Geofence;
    use tempfile::TempDir;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.monitor.dwell_threshold_ms = 120_000;
        config.location.fallback = Some(coord(51.5074, -0.1278));
        config.geofences = vec![
            Geofence::circle("home", "Home", coord(40.7128, -74.006), 100.0)
                .with_metadata("owner", "alice"),
            Geofence::polygon(
                "park",
                "Central Park",
                vec![coord(40.0, -74.0), coord(40.0, -73.9), coord(40.1, -73.9)],
            ),
        ];

        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.monitor.dwell_threshold_ms, 120_000);
        assert_eq!(loaded.monitor.check_interval_ms, DEFAULT_CHECK_INTERVAL_MS);
        assert_eq!(loaded.location.fallback, config.location.fallback);
        assert_eq!(loaded.geofences, config.geofences);
    }

    #[test]
    fn test_default_config_string_loads_as_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        ConfigFile::default().save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.monitor, ConfigFile::default().monitor);
        assert_eq!(loaded.location, ConfigFile::default().location);
        assert!(loaded.geofences.is_empty());
    }

    #[test]
    fn test_config_string_is_commented() {
        let content = ConfigFile::default().to_config_string();
        assert!(content.contains("; Fallback interval for membership evaluation"));
        assert!(content.contains("[geofence.<id>]"));
        assert!(content.contains("fallback = \n"));
    }
}
