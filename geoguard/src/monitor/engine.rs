//! Geofence monitor - membership and dwell state machine.
//!
//! [`GeofenceMonitor`] is purely synchronous: every operation takes the
//! current time explicitly, so the same engine runs under the service's
//! timer tasks, the CLI replay driver and unit tests alike.
//!
//! Each registered geofence follows its own state machine:
//!
//! ```text
//!            contains(sample)               !contains(sample)
//! OUTSIDE ───────────────────► INSIDE ─────────────────────► OUTSIDE
//!            emit Enter          │ ▲        emit Exit
//!                                └─┘ dwell ≥ threshold, first time
//!                                    emit Dwell (once per visit)
//! ```

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::coord::Coordinate;
use crate::geofence::{contains, distance_to_geofence, validate_geofence, Geofence, GeofenceError};

use super::event::{GeofenceEvent, GeofenceEventKind};
use super::state::GeofenceState;

/// Default time inside a geofence before a dwell event.
pub const DEFAULT_DWELL_THRESHOLD: Duration = Duration::from_secs(60);

/// Default number of events retained in the log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Continuous time inside before a dwell event fires.
    pub dwell_threshold: Duration,

    /// Maximum events kept in the log; oldest are dropped first.
    pub event_log_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            dwell_threshold: DEFAULT_DWELL_THRESHOLD,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

/// A geofence rejected at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedGeofence {
    pub id: String,
    pub reason: GeofenceError,
}

/// Outcome of a registration call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Ids now registered from this call, in input order.
    pub accepted: Vec<String>,
    /// Definitions that failed validation.
    pub rejected: Vec<RejectedGeofence>,
}

impl ValidationReport {
    /// True if every definition was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Membership and dwell engine.
pub struct GeofenceMonitor {
    /// Registered geofences in registration order.
    geofences: Vec<Geofence>,

    /// Visit state for geofences currently INSIDE, keyed by id.
    states: HashMap<String, GeofenceState>,

    /// Coordinate of the most recent membership pass.
    last_coordinate: Option<Coordinate>,

    /// Bounded event log.
    events: VecDeque<GeofenceEvent>,

    config: MonitorConfig,
}

impl Default for GeofenceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl GeofenceMonitor {
    /// Create a monitor with default configuration.
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            geofences: Vec::new(),
            states: HashMap::new(),
            last_coordinate: None,
            events: VecDeque::new(),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Change the dwell threshold. Visits that already fired keep their flag.
    pub fn set_dwell_threshold(&mut self, threshold: Duration) {
        self.config.dwell_threshold = threshold;
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register geofences, replacing existing definitions with the same id.
    ///
    /// Invalid definitions are logged and reported, never evaluated. A
    /// rejected definition leaves any previous geofence with its id in place.
    pub fn register(&mut self, geofences: Vec<Geofence>) -> ValidationReport {
        let mut report = ValidationReport::default();

        for geofence in geofences {
            if let Err(reason) = validate_geofence(&geofence) {
                tracing::warn!(
                    geofence_id = %geofence.id,
                    %reason,
                    "Rejected invalid geofence"
                );
                report.rejected.push(RejectedGeofence {
                    id: geofence.id,
                    reason,
                });
                continue;
            }

            tracing::debug!(
                geofence_id = %geofence.id,
                kind = geofence.shape.kind(),
                "Registered geofence"
            );
            report.accepted.push(geofence.id.clone());

            match self.geofences.iter_mut().find(|g| g.id == geofence.id) {
                Some(existing) => *existing = geofence,
                None => self.geofences.push(geofence),
            }
        }

        tracing::info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            total = self.geofences.len(),
            "Geofence registration complete"
        );
        report
    }

    /// Drop a geofence and its visit state. No event is emitted.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.geofences.len();
        self.geofences.retain(|g| g.id != id);
        self.states.remove(id);
        self.geofences.len() != before
    }

    /// Drop every geofence and all visit state. No events are emitted.
    pub fn clear(&mut self) {
        self.geofences.clear();
        self.states.clear();
    }

    /// Registered geofences in registration order.
    pub fn geofences(&self) -> &[Geofence] {
        &self.geofences
    }

    /// Look up a registered geofence.
    pub fn geofence(&self, id: &str) -> Option<&Geofence> {
        self.geofences.iter().find(|g| g.id == id)
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Membership pass: re-evaluate every geofence against `coordinate`.
    ///
    /// Returns the Enter/Exit events produced, in registration order. They
    /// are also appended to the log.
    pub fn evaluate_membership(&mut self, coordinate: Coordinate, now: Instant) -> Vec<GeofenceEvent> {
        self.last_coordinate = Some(coordinate);
        let mut emitted = Vec::new();

        for geofence in &self.geofences {
            let inside = contains(geofence, &coordinate);
            let was_inside = self.states.contains_key(&geofence.id);

            match (was_inside, inside) {
                (true, true) => {
                    if let Some(state) = self.states.get_mut(&geofence.id) {
                        state.touch(now);
                    }
                }
                (false, true) => {
                    self.states
                        .insert(geofence.id.clone(), GeofenceState::entered(&geofence.id, now));
                    emitted.push(build_event(geofence, GeofenceEventKind::Enter, coordinate, now));
                }
                (true, false) => {
                    self.states.remove(&geofence.id);
                    emitted.push(build_event(geofence, GeofenceEventKind::Exit, coordinate, now));
                }
                (false, false) => {}
            }
        }

        self.record(&emitted);
        emitted
    }

    /// Dwell pass: refresh visits and fire pending dwell events.
    ///
    /// Only geofences already INSIDE are considered; membership never
    /// changes here.
    pub fn evaluate_dwell(&mut self, now: Instant) -> Vec<GeofenceEvent> {
        let Some(coordinate) = self.last_coordinate else {
            return Vec::new();
        };
        let threshold = self.config.dwell_threshold;
        let mut emitted = Vec::new();

        for geofence in &self.geofences {
            let Some(state) = self.states.get_mut(&geofence.id) else {
                continue;
            };
            state.touch(now);

            if !state.dwell_emitted && state.dwell_time >= threshold {
                state.dwell_emitted = true;
                emitted.push(build_event(geofence, GeofenceEventKind::Dwell, coordinate, now));
            }
        }

        self.record(&emitted);
        emitted
    }

    /// Forget all visits without emitting exit events.
    pub fn clear_states(&mut self) {
        if !self.states.is_empty() {
            tracing::debug!(visits = self.states.len(), "Cleared geofence visits");
        }
        self.states.clear();
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Whether the device is currently inside `id`.
    pub fn is_inside(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    /// Continuous time inside `id` as of `now`, zero if outside.
    pub fn dwell_time(&self, id: &str, now: Instant) -> Duration {
        self.states
            .get(id)
            .map(|state| state.dwell_at(now))
            .unwrap_or_default()
    }

    /// Visit state for `id`, if inside.
    pub fn state(&self, id: &str) -> Option<&GeofenceState> {
        self.states.get(id)
    }

    /// Ids of geofences currently inside, in registration order.
    pub fn active_ids(&self) -> Vec<String> {
        self.geofences
            .iter()
            .filter(|g| self.states.contains_key(&g.id))
            .map(|g| g.id.clone())
            .collect()
    }

    /// Coordinate of the most recent membership pass.
    pub fn last_coordinate(&self) -> Option<Coordinate> {
        self.last_coordinate
    }

    /// Snapshot of the event log, oldest first.
    pub fn events(&self) -> Vec<GeofenceEvent> {
        self.events.iter().cloned().collect()
    }

    fn record(&mut self, emitted: &[GeofenceEvent]) {
        for event in emitted {
            tracing::info!(
                geofence_id = %event.geofence_id,
                kind = %event.kind,
                latitude = event.coordinate.latitude,
                longitude = event.coordinate.longitude,
                distance_m = event.distance_to_boundary,
                "Geofence event"
            );
            self.events.push_back(event.clone());
        }
        while self.events.len() > self.config.event_log_capacity {
            self.events.pop_front();
        }
    }
}

fn build_event(
    geofence: &Geofence,
    kind: GeofenceEventKind,
    coordinate: Coordinate,
    now: Instant,
) -> GeofenceEvent {
    GeofenceEvent {
        geofence_id: geofence.id.clone(),
        geofence_name: geofence.name.clone(),
        kind,
        coordinate,
        timestamp: now,
        distance_to_boundary: distance_to_geofence(&coordinate, geofence),
        metadata: geofence.metadata.clone(),
    }
}
