//! Reliability layer - typed failures, fallback chain and bounded retry.
//!
//! [`ReliableLocation`] wraps a [`LocationSource`] and owns everything the
//! rest of the crate needs to treat an unreliable source as dependable:
//!
//! - Tracking lifecycle (`Idle → Starting → Active → Stopping → Idle`, with
//!   `Error` reachable from `Starting`, `Active` and a failed stop)
//! - The single most recent fresh sample, published on a `watch` channel
//! - Classification of every failure into a [`LocationError`]
//! - The fallback chain: fresh fetch → cached sample → static fallback
//! - A consecutive-failure counter bounding [`ReliableLocation::retry_last_operation`]
//!
//! # Serialization
//!
//! At most one collaborator operation is in flight at a time. A call made
//! while another is running is rejected with a `Busy` error instead of
//! racing; it does not touch the fallback chain or the failure counter.
//!
//! # Usage
//!
//! ```ignore
//! let reliability = ReliableLocation::new(source, ReliabilityConfig::default());
//! reliability.start().await?;
//!
//! match reliability.get_current_location().await {
//!     Ok(sample) => println!("{} via {}", sample.coordinate, sample.source),
//!     Err(e) => println!("{} - {}", e.message, e.suggested_action),
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::coord::{CoordError, Coordinate};
use crate::time;

use super::error::{LocationError, LocationErrorKind, SourceError};
use super::health::HealthStatus;
use super::sample::{LocationSample, SampleSource};
use super::source::LocationSource;

/// Default bound on consecutive failures before retries are refused.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default timeout for [`ReliableLocation::wait_for_fix`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Callback invoked for every classified failure.
pub type ErrorHandler = Arc<dyn Fn(&LocationError) + Send + Sync>;

/// Configuration for the reliability layer.
#[derive(Debug, Clone)]
pub struct ReliabilityConfig {
    /// Consecutive failures after which `retry_last_operation` refuses.
    pub max_retry_attempts: u32,

    /// Static coordinate used when both the fetch and the cache fail.
    pub fallback_location: Option<Coordinate>,

    /// Timeout used by [`ReliableLocation::wait_for_fix`].
    pub wait_timeout: Duration,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            fallback_location: None,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

/// Tracking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    #[default]
    Idle,
    Starting,
    Active,
    Stopping,
    Error,
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Active => write!(f, "active"),
            Self::Stopping => write!(f, "stopping"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Operations that `retry_last_operation` can replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    GetCurrentLocation,
    WaitForLocation { timeout_seconds: u64 },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::GetCurrentLocation => write!(f, "get_current_location"),
            Self::WaitForLocation { timeout_seconds } => {
                write!(f, "wait_for_location({}s)", timeout_seconds)
            }
        }
    }
}

/// The two collaborator fetches.
#[derive(Debug, Clone, Copy)]
enum Fetch {
    Current,
    Wait { timeout_seconds: u64 },
}

impl From<Fetch> for Operation {
    fn from(fetch: Fetch) -> Self {
        match fetch {
            Fetch::Current => Operation::GetCurrentLocation,
            Fetch::Wait { timeout_seconds } => Operation::WaitForLocation { timeout_seconds },
        }
    }
}

/// Mutable state, guarded by one lock.
#[derive(Default)]
struct ReliabilityState {
    status: TrackingStatus,
    last_error: Option<LocationError>,
    last_operation: Option<Operation>,
    consecutive_failures: u32,
    /// Set by a permission failure, cleared by any success.
    permission_denied: bool,
}

impl ReliabilityState {
    fn record_error(&mut self, error: &LocationError) {
        if error.kind.is_permission() {
            self.permission_denied = true;
        }
        self.last_error = Some(error.clone());
    }
}

/// Reliability wrapper around a location collaborator.
pub struct ReliableLocation<S: LocationSource> {
    /// Underlying collaborator.
    source: S,

    /// Configuration.
    config: ReliabilityConfig,

    /// Lifecycle, errors and retry bookkeeping.
    state: Mutex<ReliabilityState>,

    /// Held for the duration of every collaborator call.
    in_flight: tokio::sync::Mutex<()>,

    /// Most recent fresh sample (the cache).
    sample_tx: watch::Sender<Option<LocationSample>>,

    /// Optional failure callback.
    error_handler: Mutex<Option<ErrorHandler>>,
}

impl<S: LocationSource> ReliableLocation<S> {
    /// Create a reliability layer around `source`.
    pub fn new(source: S, config: ReliabilityConfig) -> Self {
        let (sample_tx, _) = watch::channel(None);
        Self {
            source,
            config,
            state: Mutex::new(ReliabilityState::default()),
            in_flight: tokio::sync::Mutex::new(()),
            sample_tx,
            error_handler: Mutex::new(None),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, ReliabilityConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    /// Get the underlying collaborator.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Register a callback invoked for every classified failure.
    ///
    /// Replaces any previously registered callback.
    pub fn on_error(&self, handler: impl Fn(&LocationError) + Send + Sync + 'static) {
        *self.error_handler.lock() = Some(Arc::new(handler));
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start tracking.
    ///
    /// Succeeds immediately if already `Active` or `Starting`. On failure the
    /// status becomes `Error` and the classified error is returned; nothing
    /// is retried automatically.
    pub async fn start(&self) -> Result<(), LocationError> {
        let _guard = {
            let mut state = self.state.lock();
            if matches!(
                state.status,
                TrackingStatus::Active | TrackingStatus::Starting
            ) {
                tracing::debug!(status = %state.status, "Location tracking already started");
                return Ok(());
            }
            let guard = self.begin()?;
            state.status = TrackingStatus::Starting;
            state.last_operation = Some(Operation::Start);
            guard
        };

        tracing::debug!("Starting location tracking");
        match self.source.start_tracking().await {
            Ok(()) => {
                self.record_success(Some(TrackingStatus::Active));
                tracing::info!("Location tracking active");
                Ok(())
            }
            Err(e) => Err(self.record_failure(&e, Operation::Start)),
        }
    }

    /// Stop tracking.
    ///
    /// No-op if already `Idle` or `Stopping`. A failed stop is reported with
    /// `can_retry = false` and leaves the status at `Error`; retrying a stop
    /// has no useful effect, so it is never retried.
    pub async fn stop(&self) -> Result<(), LocationError> {
        let _guard = {
            let mut state = self.state.lock();
            if matches!(
                state.status,
                TrackingStatus::Idle | TrackingStatus::Stopping
            ) {
                tracing::debug!(status = %state.status, "Location tracking already stopped");
                return Ok(());
            }
            let guard = self.begin()?;
            state.status = TrackingStatus::Stopping;
            guard
        };

        match self.source.stop_tracking().await {
            Ok(()) => {
                self.state.lock().status = TrackingStatus::Idle;
                tracing::info!("Location tracking stopped");
                Ok(())
            }
            Err(e) => {
                let error = LocationError::from_source(&e).with_can_retry(false);
                {
                    let mut state = self.state.lock();
                    state.status = TrackingStatus::Error;
                    state.record_error(&error);
                }
                tracing::warn!(
                    kind = %error.kind,
                    detail = %error.detail,
                    "Failed to stop location tracking"
                );
                self.notify_error(&error);
                Err(error)
            }
        }
    }

    // ------------------------------------------------------------------
    // Location fetches
    // ------------------------------------------------------------------

    /// Fetch the current location, degrading through the fallback chain.
    ///
    /// Order: fresh fetch, cached sample (source `Cache`), static fallback
    /// (source `Fallback`). Fails only if all three are unavailable, or
    /// immediately with `Busy` if another operation is in flight.
    pub async fn get_current_location(&self) -> Result<LocationSample, LocationError> {
        match self.fetch(Fetch::Current).await {
            Ok(sample) => Ok(sample),
            Err(error) => self.fall_back(error),
        }
    }

    /// Wait up to `timeout_seconds` for a fresh fix, degrading through the
    /// fallback chain on failure or timeout.
    ///
    /// On timeout the collaborator's pending request is dropped, not
    /// cancelled on the collaborator side.
    pub async fn wait_for_location(
        &self,
        timeout_seconds: u64,
    ) -> Result<LocationSample, LocationError> {
        match self
            .fetch(Fetch::Wait { timeout_seconds })
            .await
        {
            Ok(sample) => Ok(sample),
            Err(error) => self.fall_back(error),
        }
    }

    /// [`Self::wait_for_location`] with the configured timeout.
    pub async fn wait_for_fix(&self) -> Result<LocationSample, LocationError> {
        self.wait_for_location(self.config.wait_timeout.as_secs())
            .await
    }

    /// Re-invoke the last attempted operation.
    ///
    /// Returns true if the operation produced a fresh result. Refuses
    /// (returns false without touching the collaborator) when nothing has
    /// been attempted yet or after `max_retry_attempts` consecutive failures.
    /// The counter is shared by all operation types and resets on any
    /// success.
    pub async fn retry_last_operation(&self) -> bool {
        let (operation, failures) = {
            let state = self.state.lock();
            (state.last_operation, state.consecutive_failures)
        };

        let Some(operation) = operation else {
            tracing::debug!("No location operation to retry");
            return false;
        };

        if failures >= self.config.max_retry_attempts {
            tracing::warn!(
                %operation,
                consecutive_failures = failures,
                max_retry_attempts = self.config.max_retry_attempts,
                "Retry limit reached, not retrying"
            );
            return false;
        }

        tracing::info!(
            %operation,
            attempt = failures + 1,
            max_retry_attempts = self.config.max_retry_attempts,
            "Retrying location operation"
        );

        match operation {
            Operation::Start => self.start().await.is_ok(),
            Operation::GetCurrentLocation => self.fetch(Fetch::Current).await.is_ok(),
            Operation::WaitForLocation { timeout_seconds } => {
                self.fetch(Fetch::Wait { timeout_seconds }).await.is_ok()
            }
        }
    }

    /// Accept a sample pushed by the host (e.g. a location-change event).
    ///
    /// Only fresh sources (`Gps`, `Network`) update the cache; replays and
    /// fallbacks are returned unchanged without being stored.
    pub fn ingest(
        &self,
        coordinate: Coordinate,
        source: SampleSource,
    ) -> Result<LocationSample, CoordError> {
        self.ingest_sample(LocationSample::new(
            Coordinate::new(coordinate.latitude, coordinate.longitude)?,
            source,
        ))
    }

    /// Like [`Self::ingest`], for fixes stamped with wall-clock time.
    pub fn ingest_at(
        &self,
        coordinate: Coordinate,
        source: SampleSource,
        measured_at: SystemTime,
    ) -> Result<LocationSample, CoordError> {
        let timestamp = time::system_time_to_instant(measured_at).unwrap_or_else(time::now);
        self.ingest_sample(LocationSample::at(
            Coordinate::new(coordinate.latitude, coordinate.longitude)?,
            source,
            timestamp,
        ))
    }

    fn ingest_sample(&self, sample: LocationSample) -> Result<LocationSample, CoordError> {
        if sample.source.is_fresh() {
            tracing::trace!(
                latitude = sample.coordinate.latitude,
                longitude = sample.coordinate.longitude,
                source = %sample.source,
                "Location sample ingested"
            );
            self.sample_tx.send_replace(Some(sample.clone()));
        }
        Ok(sample)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current lifecycle status.
    pub fn status(&self) -> TrackingStatus {
        self.state.lock().status
    }

    /// Most recent classified failure, cleared by the next success.
    pub fn last_error(&self) -> Option<LocationError> {
        self.state.lock().last_error.clone()
    }

    /// Last operation eligible for retry.
    pub fn last_operation(&self) -> Option<Operation> {
        self.state.lock().last_operation
    }

    /// Consecutive failures since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.state.lock().consecutive_failures
    }

    /// Most recent fresh sample, if any.
    pub fn cached_sample(&self) -> Option<LocationSample> {
        self.sample_tx.borrow().clone()
    }

    /// Subscribe to fresh samples.
    ///
    /// The receiver always holds the latest sample; intermediate samples may
    /// be skipped by slow readers.
    pub fn subscribe_samples(&self) -> watch::Receiver<Option<LocationSample>> {
        self.sample_tx.subscribe()
    }

    /// Snapshot of collaborator and fix health.
    pub fn health_status(&self) -> HealthStatus {
        let (status, last_error, permission_denied) = {
            let state = self.state.lock();
            (
                state.status,
                state.last_error.as_ref().map(|e| e.kind),
                state.permission_denied,
            )
        };

        HealthStatus {
            is_view_ready: self.source.is_ready(),
            has_permission: !permission_denied,
            is_gps_enabled: last_error != Some(LocationErrorKind::GpsDisabled),
            last_location_age: self.cached_sample().map(|s| s.age()),
            status,
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Claim the in-flight slot or fail with `Busy`.
    fn begin(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, LocationError> {
        self.in_flight.try_lock().map_err(|_| {
            tracing::debug!("Location operation rejected, another is in flight");
            LocationError::busy()
        })
    }

    /// Run a fresh fetch without falling back.
    async fn fetch(&self, fetch: Fetch) -> Result<LocationSample, LocationError> {
        let _guard = self.begin()?;
        let operation = Operation::from(fetch);
        self.state.lock().last_operation = Some(operation);

        let result = match fetch {
            Fetch::Current => self.source.get_current_location().await,
            Fetch::Wait { timeout_seconds } => {
                let timeout = Duration::from_secs(timeout_seconds);
                match tokio::time::timeout(timeout, self.source.wait_for_location(timeout_seconds))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Classified {
                        kind: LocationErrorKind::Timeout,
                        detail: format!("No location fix within {}s", timeout_seconds),
                    }),
                }
            }
        };

        let result = result.and_then(|coordinate| {
            Coordinate::new(coordinate.latitude, coordinate.longitude)
                .map_err(|e| SourceError::Message(e.to_string()))
        });

        match result {
            Ok(coordinate) => {
                let sample = LocationSample::new(coordinate, SampleSource::Gps);
                self.sample_tx.send_replace(Some(sample.clone()));
                self.record_success(None);
                tracing::trace!(
                    %operation,
                    latitude = coordinate.latitude,
                    longitude = coordinate.longitude,
                    "Fresh location fix"
                );
                Ok(sample)
            }
            Err(e) => Err(self.record_failure(&e, operation)),
        }
    }

    /// Resolve a failed fetch through the cache and the static fallback.
    fn fall_back(&self, error: LocationError) -> Result<LocationSample, LocationError> {
        if error.kind == LocationErrorKind::Busy {
            return Err(error);
        }

        if let Some(cached) = self.cached_sample() {
            tracing::debug!(
                kind = %error.kind,
                age_ms = cached.age().as_millis() as u64,
                "Using cached location"
            );
            return Ok(cached.as_cached());
        }

        if let Some(fallback) = self.config.fallback_location {
            tracing::debug!(kind = %error.kind, %fallback, "Using fallback location");
            return Ok(LocationSample::fallback(fallback));
        }

        Err(error)
    }

    fn record_success(&self, status: Option<TrackingStatus>) {
        let mut state = self.state.lock();
        state.consecutive_failures = 0;
        state.last_error = None;
        state.permission_denied = false;
        if let Some(status) = status {
            state.status = status;
        }
    }

    fn record_failure(&self, source_error: &SourceError, operation: Operation) -> LocationError {
        let error = LocationError::from_source(source_error);

        let failures = {
            let mut state = self.state.lock();
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
            state.record_error(&error);
            match state.status {
                TrackingStatus::Starting => state.status = TrackingStatus::Error,
                TrackingStatus::Active if error.kind.is_unrecoverable() => {
                    state.status = TrackingStatus::Error
                }
                _ => {}
            }
            state.consecutive_failures
        };

        tracing::warn!(
            %operation,
            kind = %error.kind,
            detail = %error.detail,
            consecutive_failures = failures,
            "Location operation failed"
        );
        self.notify_error(&error);
        error
    }

    fn notify_error(&self, error: &LocationError) {
        let handler = self.error_handler.lock().clone();
        if let Some(handler) = handler {
            handler(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::location::scripted::ScriptedSource;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn create_layer() -> ReliableLocation<Arc<ScriptedSource>> {
        ReliableLocation::with_defaults(Arc::new(ScriptedSource::new()))
    }

    fn create_layer_with_fallback(
        fallback: Coordinate,
    ) -> ReliableLocation<Arc<ScriptedSource>> {
        let config = ReliabilityConfig {
            fallback_location: Some(fallback),
            ..Default::default()
        };
        ReliableLocation::new(Arc::new(ScriptedSource::new()), config)
    }

    #[test]
    fn test_default_config() {
        let config = ReliabilityConfig::default();
        assert_eq!(config.max_retry_attempts, 3);
        assert!(config.fallback_location.is_none());
        assert_eq!(config.wait_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_start_success() {
        let layer = create_layer();
        assert_eq!(layer.status(), TrackingStatus::Idle);

        layer.start().await.unwrap();

        assert_eq!(layer.status(), TrackingStatus::Active);
        assert_eq!(layer.source().calls().start, 1);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let layer = create_layer();
        layer.start().await.unwrap();
        layer.start().await.unwrap();

        assert_eq!(layer.source().calls().start, 1);
        assert_eq!(layer.status(), TrackingStatus::Active);
    }

    #[tokio::test]
    async fn test_start_failure_moves_to_error() {
        let layer = create_layer();
        layer
            .source()
            .push_start_result(Err("Location services are off".into()));

        let error = layer.start().await.unwrap_err();

        assert_eq!(error.kind, LocationErrorKind::GpsDisabled);
        assert_eq!(
            error.suggested_action,
            "Please enable location services in your device settings"
        );
        assert_eq!(layer.status(), TrackingStatus::Error);
        assert_eq!(layer.last_error(), Some(error));
        assert_eq!(layer.consecutive_failures(), 1);
        // No automatic retry
        assert_eq!(layer.source().calls().start, 1);
    }

    #[tokio::test]
    async fn test_start_after_error_can_succeed() {
        let layer = create_layer();
        layer
            .source()
            .push_start_result(Err("permission denied".into()));
        assert!(layer.start().await.is_err());

        layer.start().await.unwrap();

        assert_eq!(layer.status(), TrackingStatus::Active);
        assert!(layer.last_error().is_none());
        assert_eq!(layer.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let layer = create_layer();
        layer.stop().await.unwrap();
        assert_eq!(layer.source().calls().stop, 0);
    }

    #[tokio::test]
    async fn test_stop_success() {
        let layer = create_layer();
        layer.start().await.unwrap();
        layer.stop().await.unwrap();

        assert_eq!(layer.status(), TrackingStatus::Idle);
        assert_eq!(layer.source().calls().stop, 1);
    }

    #[tokio::test]
    async fn test_stop_failure_is_not_retryable() {
        let layer = create_layer();
        layer.start().await.unwrap();
        layer
            .source()
            .push_stop_result(Err("Request timeout".into()));

        let error = layer.stop().await.unwrap_err();

        assert_eq!(error.kind, LocationErrorKind::Timeout);
        assert!(!error.can_retry);
        assert_eq!(layer.status(), TrackingStatus::Error);
        // Stop is never the retry target
        assert_eq!(layer.last_operation(), Some(Operation::Start));
        assert_eq!(layer.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_get_current_location_fresh() {
        let layer = create_layer();
        layer.source().push_fix(coord(40.7128, -74.0060));

        let sample = layer.get_current_location().await.unwrap();

        assert_eq!(sample.source, SampleSource::Gps);
        assert_eq!(sample.coordinate, coord(40.7128, -74.0060));
        assert_eq!(layer.cached_sample(), Some(sample));
    }

    #[tokio::test]
    async fn test_get_current_location_falls_back_to_cache() {
        let layer = create_layer_with_fallback(coord(0.0, 0.0));
        layer.source().push_fix(coord(40.7128, -74.0060));
        layer.source().push_failure("no signal");

        let fresh = layer.get_current_location().await.unwrap();
        let cached = layer.get_current_location().await.unwrap();

        assert_eq!(cached.source, SampleSource::Cache);
        assert_eq!(cached.coordinate, fresh.coordinate);
        assert_eq!(cached.timestamp, fresh.timestamp);
        assert_eq!(layer.consecutive_failures(), 1);
        assert_eq!(
            layer.last_error().map(|e| e.kind),
            Some(LocationErrorKind::NoSignal)
        );
    }

    #[tokio::test]
    async fn test_get_current_location_falls_back_to_static() {
        let layer = create_layer_with_fallback(coord(51.5074, -0.1278));
        layer.source().push_failure("gps disabled");

        let sample = layer.get_current_location().await.unwrap();

        assert_eq!(sample.source, SampleSource::Fallback);
        assert_eq!(sample.coordinate, coord(51.5074, -0.1278));
        // Fallbacks never populate the cache
        assert!(layer.cached_sample().is_none());
    }

    #[tokio::test]
    async fn test_get_current_location_fails_without_fallbacks() {
        let layer = create_layer();
        layer.source().push_failure("Map view not ready");

        let error = layer.get_current_location().await.unwrap_err();
        assert_eq!(error.kind, LocationErrorKind::ViewNotReady);
    }

    #[tokio::test]
    async fn test_invalid_fix_is_a_failure() {
        let layer = create_layer();
        layer.source().push_fix(Coordinate {
            latitude: 120.0,
            longitude: 0.0,
        });

        let error = layer.get_current_location().await.unwrap_err();
        assert_eq!(error.kind, LocationErrorKind::Unknown);
        assert!(layer.cached_sample().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_location_times_out() {
        let layer = create_layer_with_fallback(coord(1.0, 1.0));
        layer.source().push_fix(coord(2.0, 2.0));
        layer.source().set_fetch_delay(Some(Duration::from_secs(30)));

        let sample = layer.wait_for_location(5).await.unwrap();

        assert_eq!(sample.source, SampleSource::Fallback);
        assert_eq!(
            layer.last_error().map(|e| e.kind),
            Some(LocationErrorKind::Timeout)
        );
        assert_eq!(
            layer.last_operation(),
            Some(Operation::WaitForLocation { timeout_seconds: 5 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_location_within_timeout() {
        let layer = create_layer();
        layer.source().push_fix(coord(2.0, 2.0));
        layer.source().set_fetch_delay(Some(Duration::from_secs(1)));

        let sample = layer.wait_for_location(5).await.unwrap();
        assert_eq!(sample.source, SampleSource::Gps);
    }

    #[tokio::test]
    async fn test_unrecoverable_failure_while_active() {
        let layer = create_layer();
        layer.start().await.unwrap();

        layer.source().push_failure("signal lost");
        let _ = layer.get_current_location().await;
        assert_eq!(layer.status(), TrackingStatus::Active);

        layer.source().push_failure("permission denied");
        let _ = layer.get_current_location().await;
        assert_eq!(layer.status(), TrackingStatus::Error);
    }

    #[tokio::test]
    async fn test_retry_without_history_returns_false() {
        let layer = create_layer();
        assert!(!layer.retry_last_operation().await);
        assert_eq!(layer.source().calls().total(), 0);
    }

    #[tokio::test]
    async fn test_retry_replays_last_operation() {
        let layer = create_layer();
        layer.source().push_failure("timeout");
        layer.source().push_fix(coord(3.0, 4.0));

        assert!(layer.get_current_location().await.is_err());
        assert!(layer.retry_last_operation().await);

        assert_eq!(layer.source().calls().current, 2);
        assert_eq!(layer.consecutive_failures(), 0);
        assert_eq!(
            layer.cached_sample().map(|s| s.coordinate),
            Some(coord(3.0, 4.0))
        );
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let layer = create_layer();
        layer.source().push_start_result(Err("no signal".into()));
        layer.source().push_start_result(Err("no signal".into()));
        layer.source().push_start_result(Err("no signal".into()));

        assert!(layer.start().await.is_err());
        assert!(!layer.retry_last_operation().await);
        assert!(!layer.retry_last_operation().await);
        assert_eq!(layer.consecutive_failures(), 3);
        assert_eq!(layer.source().calls().start, 3);

        // Exhausted: no further collaborator calls
        assert!(!layer.retry_last_operation().await);
        assert_eq!(layer.source().calls().start, 3);

        // A manual success resets the counter
        layer.start().await.unwrap();
        assert_eq!(layer.consecutive_failures(), 0);
        assert!(layer.retry_last_operation().await);
    }

    #[tokio::test]
    async fn test_failure_counter_shared_across_operations() {
        let layer = create_layer();
        layer.source().push_start_result(Err("timeout".into()));
        layer.source().push_failure("timeout");
        layer.source().push_failure("timeout");

        assert!(layer.start().await.is_err());
        assert!(layer.get_current_location().await.is_err());
        assert!(layer.wait_for_location(1).await.is_err());

        assert_eq!(layer.consecutive_failures(), 3);
        let calls_before = layer.source().calls();
        assert!(!layer.retry_last_operation().await);
        assert_eq!(layer.source().calls(), calls_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_operation_is_busy() {
        let layer = Arc::new(create_layer());
        layer.source().push_fix(coord(1.0, 1.0));
        layer.source().set_fetch_delay(Some(Duration::from_secs(2)));

        let background = {
            let layer = Arc::clone(&layer);
            tokio::spawn(async move { layer.get_current_location().await })
        };
        // Let the spawned fetch claim the in-flight slot
        tokio::task::yield_now().await;

        let error = layer.get_current_location().await.unwrap_err();
        assert_eq!(error.kind, LocationErrorKind::Busy);
        assert_eq!(layer.consecutive_failures(), 0);

        let sample = background.await.unwrap().unwrap();
        assert_eq!(sample.source, SampleSource::Gps);
    }

    #[tokio::test]
    async fn test_error_handler_invoked() {
        let layer = create_layer();
        let count = Arc::new(AtomicUsize::new(0));
        {
            let count = Arc::clone(&count);
            layer.on_error(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        layer.source().push_failure("no signal");
        let _ = layer.get_current_location().await;
        layer.source().push_start_result(Err("gps off".into()));
        let _ = layer.start().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ingest_updates_cache_only_for_fresh_sources() {
        let layer = create_layer();
        let mut rx = layer.subscribe_samples();

        layer
            .ingest(coord(5.0, 5.0), SampleSource::Fallback)
            .unwrap();
        assert!(layer.cached_sample().is_none());

        let sample = layer.ingest(coord(6.0, 6.0), SampleSource::Network).unwrap();
        assert_eq!(layer.cached_sample(), Some(sample));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_ingest_rejects_invalid_coordinate() {
        let layer = create_layer();
        let bad = Coordinate {
            latitude: 0.0,
            longitude: 200.0,
        };
        assert!(layer.ingest(bad, SampleSource::Gps).is_err());
    }

    #[tokio::test]
    async fn test_health_status() {
        let layer = create_layer();
        let health = layer.health_status();
        assert!(health.is_view_ready);
        assert!(health.has_permission);
        assert!(health.is_gps_enabled);
        assert!(health.last_location_age.is_none());

        layer.source().set_ready(false);
        layer.source().push_start_result(Err("permission denied".into()));
        let _ = layer.start().await;

        let health = layer.health_status();
        assert!(!health.is_view_ready);
        assert!(!health.has_permission);
        assert!(health.is_gps_enabled);
        assert_eq!(health.status, TrackingStatus::Error);

        layer.source().push_failure("gps off");
        let _ = layer.get_current_location().await;
        let health = layer.health_status();
        assert!(!health.is_gps_enabled);
        // A later non-permission failure does not grant permission
        assert!(!health.has_permission);
    }

    #[tokio::test]
    async fn test_permission_denial_outlives_other_failures() {
        let layer = create_layer();

        layer.source().push_failure("Location permission denied");
        layer.source().push_failure("no signal");
        let _ = layer.get_current_location().await;
        let _ = layer.get_current_location().await;

        assert_eq!(
            layer.last_error().map(|e| e.kind),
            Some(LocationErrorKind::NoSignal)
        );
        assert!(!layer.health_status().has_permission);

        layer.source().push_fix(coord(1.0, 1.0));
        layer.get_current_location().await.unwrap();
        assert!(layer.health_status().has_permission);
    }

    #[tokio::test]
    async fn test_retry_replays_the_failed_fetch_kind() {
        let layer = create_layer();

        layer.source().push_failure("no signal");
        let _ = layer.get_current_location().await;
        layer.source().push_fix(coord(1.0, 1.0));

        assert!(layer.retry_last_operation().await);
        let calls = layer.source().calls();
        assert_eq!(calls.current, 2);
        assert_eq!(calls.start, 0);
        assert_eq!(calls.wait, 0);

        layer.source().push_failure("no signal");
        let _ = layer.wait_for_location(3).await;
        layer.source().push_fix(coord(1.0, 1.0));

        assert!(layer.retry_last_operation().await);
        assert_eq!(
            layer.last_operation(),
            Some(Operation::WaitForLocation { timeout_seconds: 3 })
        );
        let calls = layer.source().calls();
        assert_eq!(calls.wait, 2);
        assert_eq!(calls.current, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_fix_uses_configured_timeout() {
        let config = ReliabilityConfig {
            wait_timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let layer = ReliableLocation::new(Arc::new(ScriptedSource::new()), config);
        layer.source().set_fetch_delay(Some(Duration::from_secs(30)));
        layer.source().push_fix(coord(1.0, 1.0));

        let started = tokio::time::Instant::now();
        let error = layer.wait_for_fix().await.unwrap_err();

        assert_eq!(error.kind, LocationErrorKind::Timeout);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert_eq!(
            layer.last_operation(),
            Some(Operation::WaitForLocation { timeout_seconds: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_reports_location_age() {
        let layer = create_layer();
        layer.source().push_fix(coord(1.0, 1.0));
        layer.get_current_location().await.unwrap();

        tokio::time::advance(Duration::from_secs(7)).await;

        assert_eq!(
            layer.health_status().last_location_age,
            Some(Duration::from_secs(7))
        );
    }
}
