//! Location collaborator contract.
//!
//! The host environment (typically the map view) supplies an implementation
//! of [`LocationSource`]. Every operation except [`LocationSource::is_ready`]
//! may suspend on hardware or the network and may fail.

use std::future::Future;
use std::sync::Arc;

use crate::coord::Coordinate;

use super::error::SourceError;

/// Trait for the underlying location provider.
pub trait LocationSource: Send + Sync {
    /// Begin producing location fixes.
    fn start_tracking(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Stop producing location fixes.
    fn stop_tracking(&self) -> impl Future<Output = Result<(), SourceError>> + Send;

    /// Fetch the current position.
    fn get_current_location(&self) -> impl Future<Output = Result<Coordinate, SourceError>> + Send;

    /// Wait up to `timeout_seconds` for a fresh fix.
    fn wait_for_location(
        &self,
        timeout_seconds: u64,
    ) -> impl Future<Output = Result<Coordinate, SourceError>> + Send;

    /// Non-blocking readiness probe.
    fn is_ready(&self) -> bool;
}

// Allow Arc<S> to be used as a source so tests and hosts can keep a handle
impl<S: LocationSource> LocationSource for Arc<S> {
    fn start_tracking(&self) -> impl Future<Output = Result<(), SourceError>> + Send {
        (**self).start_tracking()
    }

    fn stop_tracking(&self) -> impl Future<Output = Result<(), SourceError>> + Send {
        (**self).stop_tracking()
    }

    fn get_current_location(&self) -> impl Future<Output = Result<Coordinate, SourceError>> + Send {
        (**self).get_current_location()
    }

    fn wait_for_location(
        &self,
        timeout_seconds: u64,
    ) -> impl Future<Output = Result<Coordinate, SourceError>> + Send {
        (**self).wait_for_location(timeout_seconds)
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}
