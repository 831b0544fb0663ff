//! Geofence monitoring.
//!
//! - [`GeofenceMonitor`]: synchronous membership and dwell engine
//! - [`GeofenceEvent`]: Enter / Exit / Dwell transitions
//! - [`EventHub`]: broadcast channel plus callback fan-out
//!
//! The monitor itself never touches timers or locks; the service drives it
//! from two tokio tasks and the CLI replay drives it from a virtual clock.

mod engine;
mod event;
mod hub;
mod state;

pub use engine::{
    GeofenceMonitor, MonitorConfig, RejectedGeofence, ValidationReport,
    DEFAULT_DWELL_THRESHOLD, DEFAULT_EVENT_LOG_CAPACITY,
};
pub use event::{GeofenceEvent, GeofenceEventKind};
pub use hub::{EventHandler, EventHub, Subscription, DEFAULT_EVENT_CHANNEL_CAPACITY};
pub use state::GeofenceState;
