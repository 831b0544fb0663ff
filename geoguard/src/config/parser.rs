//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::Coordinate;
use crate::geofence::{Geofence, GeofenceShape, Metadata};

/// Section name prefix for geofence definitions (`[geofence.<id>]`).
pub(super) const GEOFENCE_SECTION_PREFIX: &str = "geofence.";

/// Key prefix for geofence metadata entries (`meta.<key> = value`).
pub(super) const METADATA_KEY_PREFIX: &str = "meta.";

/// Separator between polygon vertices.
pub(super) const VERTEX_SEPARATOR: char = '|';

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
/// Geofence sections are parsed for syntax only; geometric validity is checked
/// when they are registered with a monitor.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [monitor] section
    if let Some(section) = ini.section(Some("monitor")) {
        if let Some(v) = section.get("check_interval_ms") {
            config.monitor.check_interval_ms = parse_positive(
                "monitor",
                "check_interval_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("dwell_threshold_ms") {
            config.monitor.dwell_threshold_ms =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "monitor".to_string(),
                    key: "dwell_threshold_ms".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (milliseconds)".to_string(),
                })?;
        }
        if let Some(v) = section.get("dwell_check_interval_ms") {
            config.monitor.dwell_check_interval_ms = parse_positive(
                "monitor",
                "dwell_check_interval_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("event_log_capacity") {
            config.monitor.event_log_capacity =
                parse_positive("monitor", "event_log_capacity", v, "must be a positive integer")?;
        }
        if let Some(v) = section.get("event_channel_capacity") {
            config.monitor.event_channel_capacity = parse_positive(
                "monitor",
                "event_channel_capacity",
                v,
                "must be a positive integer",
            )?;
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("max_retry_attempts") {
            config.location.max_retry_attempts =
                v.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "location".to_string(),
                    key: "max_retry_attempts".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer".to_string(),
                })?;
        }
        if let Some(v) = section.get("wait_timeout_secs") {
            config.location.wait_timeout_secs = parse_positive(
                "location",
                "wait_timeout_secs",
                v,
                "must be a positive integer (seconds)",
            )?;
        }
        if let Some(v) = section.get("fallback") {
            let v = v.trim();
            if !v.is_empty() {
                config.location.fallback = Some(parse_coordinate("location", "fallback", v)?);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    // [geofence.<id>] sections
    for (name, properties) in ini.iter() {
        let Some(name) = name else {
            continue;
        };
        if let Some(id) = name.strip_prefix(GEOFENCE_SECTION_PREFIX) {
            config
                .geofences
                .push(parse_geofence(name, id.trim(), properties)?);
        }
    }

    Ok(config)
}

/// Parse one `[geofence.<id>]` section.
fn parse_geofence(
    section: &str,
    id: &str,
    properties: &Properties,
) -> Result<Geofence, ConfigFileError> {
    let name = properties
        .get("name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(id)
        .to_string();

    let kind = required(section, properties, "type")?.to_lowercase();
    let shape = match kind.as_str() {
        "circle" => {
            let center = parse_coordinate(section, "center", required(section, properties, "center")?)?;
            let radius = required(section, properties, "radius_m")?;
            let radius_meters: f64 = radius.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: section.to_string(),
                key: "radius_m".to_string(),
                value: radius.to_string(),
                reason: "must be a number (meters)".to_string(),
            })?;
            GeofenceShape::Circle {
                center,
                radius_meters,
            }
        }
        "polygon" => {
            let vertices = required(section, properties, "vertices")?
                .split(VERTEX_SEPARATOR)
                .map(|v| parse_coordinate(section, "vertices", v.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            GeofenceShape::Polygon { vertices }
        }
        _ => {
            return Err(ConfigFileError::InvalidValue {
                section: section.to_string(),
                key: "type".to_string(),
                value: kind,
                reason: "must be 'circle' or 'polygon'".to_string(),
            });
        }
    };

    let metadata: Metadata = properties
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(METADATA_KEY_PREFIX)
                .map(|k| (k.to_string(), value.trim().to_string()))
        })
        .collect();

    Ok(Geofence {
        id: id.to_string(),
        name,
        shape,
        metadata,
    })
}

/// Get a required, non-empty key.
fn required<'a>(
    section: &str,
    properties: &'a Properties,
    key: &str,
) -> Result<&'a str, ConfigFileError> {
    properties
        .get(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: String::new(),
            reason: "is required".to_string(),
        })
}

/// Parse a `lat, lon` pair.
fn parse_coordinate(section: &str, key: &str, value: &str) -> Result<Coordinate, ConfigFileError> {
    Coordinate::from_str(value).map_err(|e| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an integer that must be greater than zero.
fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
