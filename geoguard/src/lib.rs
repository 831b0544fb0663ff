//! GeoGuard - geofence monitoring on top of an unreliable location source
//!
//! This library tracks a device's membership in circular and polygonal
//! geofences, emits enter / exit / dwell events, and hardens the location
//! collaborator with typed failures, a cache → fallback chain and bounded
//! retries.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use geoguard::service::{GeofenceService, MonitorOptions, ServiceConfig};
//! use geoguard::geofence::Geofence;
//!
//! let service = GeofenceService::new(host_source, ServiceConfig::default());
//! service.register_geofences(vec![Geofence::circle("home", "Home", center, 100.0)]);
//!
//! let _subscription = service.on_event(|event| println!("{event}"));
//! service.start(MonitorOptions::default()).await?;
//! ```

pub mod config;
pub mod coord;
pub mod geofence;
pub mod location;
pub mod logging;
pub mod monitor;
pub mod replay;
pub mod service;
pub mod time;

/// Version of the GeoGuard library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
