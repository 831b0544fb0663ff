//! Location acquisition and reliability.
//!
//! This module turns an unreliable host-supplied location collaborator into
//! something the geofence monitor can depend on.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐       ┌─────────────────────┐
//! │  LocationSource  │──────►│  ReliableLocation   │──► watch<Option<LocationSample>>
//! │ (host / scripted)│       │ classify · fallback │          │
//! └──────────────────┘       │ retry · busy guard  │          ▼
//!          ▲                 └─────────────────────┘    geofence monitor
//!          │                           ▲
//!      host pushes ─────── ingest() ───┘
//! ```
//!
//! # Key Types
//!
//! - [`LocationSource`]: collaborator contract (start/stop, fetch, wait)
//! - [`ReliableLocation`]: lifecycle, fallback chain and bounded retry
//! - [`LocationSample`]: coordinate + timestamp + [`SampleSource`]
//! - [`LocationError`]: classified failure with a suggested action
//! - [`HealthStatus`]: readiness snapshot
//! - [`ScriptedSource`]: queued-response source for replays and tests

mod error;
mod health;
mod reliability;
mod sample;
mod scripted;
mod source;

pub use error::{classify_message, LocationError, LocationErrorKind, SourceError};
pub use health::HealthStatus;
pub use reliability::{
    ErrorHandler, Operation, ReliabilityConfig, ReliableLocation, TrackingStatus,
    DEFAULT_MAX_RETRY_ATTEMPTS, DEFAULT_WAIT_TIMEOUT,
};
pub use sample::{LocationSample, SampleSource};
pub use scripted::{CallCounts, ScriptedSource, NO_FIX_MESSAGE};
pub use source::LocationSource;
