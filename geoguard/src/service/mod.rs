//! High-level service facade for geofence monitoring.
//!
//! This module wires the location reliability layer, the monitor engine and
//! the event hub together behind one API.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use geoguard::service::{GeofenceService, MonitorOptions, ServiceConfig};
//!
//! let config = ServiceConfig::builder()
//!     .dwell_threshold(Duration::from_secs(120))
//!     .build();
//!
//! let service = GeofenceService::new(host_source, config);
//! let report = service.register_geofences(geofences);
//! let mut events = service.subscribe();
//!
//! service.start(MonitorOptions::default()).await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{event}");
//! }
//! ```

mod config;
mod facade;
mod loops;

pub use config::{
    MonitorOptions, ServiceConfig, ServiceConfigBuilder, DEFAULT_CHECK_INTERVAL,
    DEFAULT_DWELL_CHECK_INTERVAL,
};
pub use facade::GeofenceService;
