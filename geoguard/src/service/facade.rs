//! Geofence service facade.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::coord::{CoordError, Coordinate};
use crate::geofence::Geofence;
use crate::location::{
    HealthStatus, LocationError, LocationSample, LocationSource, ReliableLocation, SampleSource,
    TrackingStatus,
};
use crate::monitor::{
    EventHub, GeofenceEvent, GeofenceMonitor, Subscription, ValidationReport,
};
use crate::time;

use super::config::{MonitorOptions, ServiceConfig};
use super::loops::EvaluationLoops;

/// Geofence monitoring on top of a location collaborator.
///
/// Wires a [`ReliableLocation`] to a [`GeofenceMonitor`] and an [`EventHub`]:
/// fresh samples flow from the reliability layer's watch channel into the
/// membership loop, and resulting events fan out to subscribers.
///
/// # Example
///
/// ```ignore
/// let service = GeofenceService::new(source, ServiceConfig::default());
/// service.register_geofences(vec![home]);
///
/// let _subscription = service.on_event(|event| println!("{event}"));
/// service.start(MonitorOptions::default()).await?;
/// ```
pub struct GeofenceService<S: LocationSource> {
    reliability: Arc<ReliableLocation<S>>,
    monitor: Arc<Mutex<GeofenceMonitor>>,
    hub: Arc<EventHub>,
    loops: Mutex<Option<EvaluationLoops>>,
    config: ServiceConfig,
}

impl<S: LocationSource> GeofenceService<S> {
    /// Create a stopped service around `source`.
    pub fn new(source: S, config: ServiceConfig) -> Self {
        Self {
            reliability: Arc::new(ReliableLocation::new(source, config.reliability().clone())),
            monitor: Arc::new(Mutex::new(GeofenceMonitor::with_config(
                config.monitor().clone(),
            ))),
            hub: Arc::new(EventHub::new(config.event_channel_capacity())),
            loops: Mutex::new(None),
            config,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, ServiceConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get the reliability layer.
    pub fn reliability(&self) -> &Arc<ReliableLocation<S>> {
        &self.reliability
    }

    // ------------------------------------------------------------------
    // Geofences
    // ------------------------------------------------------------------

    /// Register geofences. Invalid definitions are reported and skipped.
    pub fn register_geofences(&self, geofences: Vec<Geofence>) -> ValidationReport {
        self.monitor.lock().register(geofences)
    }

    /// Remove a geofence and its visit without an exit event.
    pub fn remove_geofence(&self, id: &str) -> bool {
        self.monitor.lock().remove(id)
    }

    /// Remove every geofence without exit events.
    pub fn clear_geofences(&self) {
        self.monitor.lock().clear();
    }

    /// Registered geofences in registration order.
    pub fn geofences(&self) -> Vec<Geofence> {
        self.monitor.lock().geofences().to_vec()
    }

    /// Whether the device is currently inside `id`.
    pub fn is_in_geofence(&self, id: &str) -> bool {
        self.monitor.lock().is_inside(id)
    }

    /// Continuous time inside `id`, zero if outside.
    pub fn dwell_time(&self, id: &str) -> Duration {
        self.monitor.lock().dwell_time(id, time::now())
    }

    /// Ids of geofences currently inside.
    pub fn active_geofences(&self) -> Vec<String> {
        self.monitor.lock().active_ids()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start monitoring.
    ///
    /// Starts the evaluation loops (once; repeated calls leave the running
    /// loops alone) and then location tracking. A tracking failure is
    /// returned, but the loops keep running so host-pushed samples are still
    /// evaluated.
    pub async fn start(&self, options: MonitorOptions) -> Result<(), LocationError> {
        if let Some(threshold) = options.dwell_threshold {
            self.monitor.lock().set_dwell_threshold(threshold);
        }

        {
            let mut loops = self.loops.lock();
            if loops.is_none() {
                let check_interval = options
                    .check_interval
                    .unwrap_or(self.config.check_interval());
                *loops = Some(EvaluationLoops::spawn(
                    Arc::clone(&self.monitor),
                    Arc::clone(&self.hub),
                    self.reliability.subscribe_samples(),
                    check_interval,
                    self.config.dwell_check_interval(),
                ));
                tracing::info!(
                    geofences = self.monitor.lock().geofences().len(),
                    "Geofence monitoring started"
                );
            } else {
                tracing::debug!("Geofence monitoring already running");
            }
        }

        self.reliability.start().await
    }

    /// Stop monitoring.
    ///
    /// Cancels the evaluation loops, forgets every visit without emitting
    /// exit events, then stops location tracking.
    pub async fn stop(&self) -> Result<(), LocationError> {
        let loops = self.loops.lock().take();
        if let Some(loops) = loops {
            loops.shutdown().await;
            tracing::info!("Geofence monitoring stopped");
        }
        self.monitor.lock().clear_states();

        self.reliability.stop().await
    }

    /// Whether the evaluation loops are running.
    pub fn is_monitoring(&self) -> bool {
        self.loops.lock().is_some()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe to events as a broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<GeofenceEvent> {
        self.hub.subscribe()
    }

    /// Attach an event callback for as long as the subscription lives.
    pub fn on_event(
        &self,
        handler: impl Fn(&GeofenceEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.hub.on_event(handler)
    }

    /// Attach a callback for classified location failures.
    pub fn on_error(&self, handler: impl Fn(&LocationError) + Send + Sync + 'static) {
        self.reliability.on_error(handler);
    }

    /// Snapshot of the event log, oldest first.
    pub fn events(&self) -> Vec<GeofenceEvent> {
        self.monitor.lock().events()
    }

    // ------------------------------------------------------------------
    // Location passthroughs
    // ------------------------------------------------------------------

    /// See [`ReliableLocation::get_current_location`].
    pub async fn get_current_location(&self) -> Result<LocationSample, LocationError> {
        self.reliability.get_current_location().await
    }

    /// See [`ReliableLocation::wait_for_location`].
    pub async fn wait_for_location(
        &self,
        timeout_seconds: u64,
    ) -> Result<LocationSample, LocationError> {
        self.reliability.wait_for_location(timeout_seconds).await
    }

    /// Wait for a fix using the configured `wait_timeout`.
    pub async fn wait_for_fix(&self) -> Result<LocationSample, LocationError> {
        self.reliability.wait_for_fix().await
    }

    /// See [`ReliableLocation::retry_last_operation`].
    pub async fn retry_last_operation(&self) -> bool {
        self.reliability.retry_last_operation().await
    }

    /// Push a sample from the host.
    pub fn ingest(
        &self,
        coordinate: Coordinate,
        source: SampleSource,
    ) -> Result<LocationSample, CoordError> {
        self.reliability.ingest(coordinate, source)
    }

    /// Push a sample measured at a wall-clock time.
    pub fn ingest_at(
        &self,
        coordinate: Coordinate,
        source: SampleSource,
        measured_at: SystemTime,
    ) -> Result<LocationSample, CoordError> {
        self.reliability.ingest_at(coordinate, source, measured_at)
    }

    /// Snapshot of collaborator and fix health.
    pub fn health_status(&self) -> HealthStatus {
        self.reliability.health_status()
    }

    /// Tracking lifecycle status.
    pub fn status(&self) -> TrackingStatus {
        self.reliability.status()
    }

    /// Most recent classified failure.
    pub fn last_error(&self) -> Option<LocationError> {
        self.reliability.last_error()
    }
}

impl<S: LocationSource> Drop for GeofenceService<S> {
    fn drop(&mut self) {
        // Dropping the loops cancels the timer tasks
        if self.loops.get_mut().take().is_some() {
            tracing::debug!("Geofence service dropped while monitoring");
        }
    }
}
