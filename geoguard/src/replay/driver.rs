//! Virtual-clock replay of a recorded track.
//!
//! The driver plays a [`Track`] through the same pieces the live service
//! uses: a [`ScriptedSource`] wrapped in a [`ReliableLocation`], a
//! [`GeofenceMonitor`] and an [`EventHub`]. Instead of tokio timers it
//! steps both evaluation cadences on a virtual clock, so a day-long track
//! replays instantly and always yields the same events.
//!
//! Order at a given instant: timers strictly before the step, then the
//! step itself, then timers due at the step's offset. On a tie between the
//! two cadences the membership pass runs first.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::geofence::Geofence;
use crate::location::{
    LocationErrorKind, ReliableLocation, SampleSource, ScriptedSource,
};
use crate::monitor::{EventHub, GeofenceEvent, GeofenceMonitor, ValidationReport};
use crate::service::ServiceConfig;
use crate::time;

use super::track::{Track, TrackStep};

/// Replay settings.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Membership fallback interval.
    pub check_interval: Duration,
    /// Dwell timer interval.
    pub dwell_check_interval: Duration,
    /// Extra virtual time after the last step, so trailing dwells can fire.
    pub tail: Duration,
}

impl ReplayOptions {
    /// Take intervals from a service configuration.
    pub fn from_service_config(config: &ServiceConfig, tail: Duration) -> Self {
        Self {
            check_interval: config.check_interval(),
            dwell_check_interval: config.dwell_check_interval(),
            tail,
        }
    }
}

/// An event with its offset from the start of the track.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    pub offset: Duration,
    pub event: GeofenceEvent,
}

/// A step where no fresh fix was available.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayIssue {
    pub offset: Duration,
    pub kind: LocationErrorKind,
    pub detail: String,
    /// What the fallback chain served instead, if anything.
    pub served: Option<SampleSource>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub registration: ValidationReport,
    pub events: Vec<ReplayEvent>,
    pub issues: Vec<ReplayIssue>,
    /// Fresh fixes evaluated.
    pub fixes: usize,
}

/// Plays tracks against a fixed set of geofences.
pub struct ReplayDriver {
    config: ServiceConfig,
    options: ReplayOptions,
}

impl ReplayDriver {
    pub fn new(config: ServiceConfig, options: ReplayOptions) -> Self {
        Self { config, options }
    }

    /// Replay `track` against `geofences`.
    ///
    /// Events are also dispatched through `hub` as they occur, if given.
    pub async fn run(
        &self,
        geofences: Vec<Geofence>,
        track: &Track,
        hub: Option<&EventHub>,
    ) -> ReplayReport {
        let source = Arc::new(ScriptedSource::new());
        let reliability =
            ReliableLocation::new(Arc::clone(&source), self.config.reliability().clone());
        let mut monitor = GeofenceMonitor::with_config(self.config.monitor().clone());

        let mut report = ReplayReport {
            registration: monitor.register(geofences),
            ..Default::default()
        };

        let mut clock = VirtualClock::new(time::now(), &self.options);

        for point in track.points() {
            let events = clock.run_timers(point.offset, false, &mut monitor, &reliability);
            collect(&mut report, hub, &clock, events);

            match &point.step {
                TrackStep::Fix(coordinate) => source.push_fix(*coordinate),
                TrackStep::Failure(message) => source.push_failure(message.as_str()),
            }

            match reliability.get_current_location().await {
                Ok(sample) if sample.source.is_fresh() => {
                    report.fixes += 1;
                    let events = monitor.evaluate_membership(sample.coordinate, clock.at(point.offset));
                    collect(&mut report, hub, &clock, events);
                }
                Ok(sample) => report.issues.push(issue(point.offset, &reliability, Some(sample.source))),
                Err(_) => report.issues.push(issue(point.offset, &reliability, None)),
            }
        }

        let end = track.duration() + self.options.tail;
        let events = clock.run_timers(end, true, &mut monitor, &reliability);
        collect(&mut report, hub, &clock, events);

        tracing::info!(
            steps = track.points().len(),
            fixes = report.fixes,
            events = report.events.len(),
            issues = report.issues.len(),
            "Replay complete"
        );
        report
    }
}

fn issue(
    offset: Duration,
    reliability: &ReliableLocation<Arc<ScriptedSource>>,
    served: Option<SampleSource>,
) -> ReplayIssue {
    let (kind, detail) = reliability
        .last_error()
        .map(|e| (e.kind, e.detail))
        .unwrap_or((LocationErrorKind::Unknown, String::new()));
    ReplayIssue {
        offset,
        kind,
        detail,
        served,
    }
}

fn collect(
    report: &mut ReplayReport,
    hub: Option<&EventHub>,
    clock: &VirtualClock,
    events: Vec<GeofenceEvent>,
) {
    if let Some(hub) = hub {
        hub.dispatch(&events);
    }
    report.events.extend(events.into_iter().map(|event| ReplayEvent {
        offset: clock.offset_of(event.timestamp),
        event,
    }));
}

/// Next due offsets of the two evaluation cadences.
struct VirtualClock {
    base: Instant,
    check_interval: Duration,
    dwell_check_interval: Duration,
    membership_due: Duration,
    dwell_due: Duration,
}

impl VirtualClock {
    fn new(base: Instant, options: &ReplayOptions) -> Self {
        let min_tick = Duration::from_millis(1);
        Self {
            base,
            check_interval: options.check_interval.max(min_tick),
            dwell_check_interval: options.dwell_check_interval.max(min_tick),
            membership_due: Duration::ZERO,
            dwell_due: Duration::ZERO,
        }
    }

    fn at(&self, offset: Duration) -> Instant {
        self.base + offset
    }

    fn offset_of(&self, instant: Instant) -> Duration {
        instant.saturating_duration_since(self.base)
    }

    /// Run every timer pass due before `limit` (or at it, if `inclusive`).
    fn run_timers(
        &mut self,
        limit: Duration,
        inclusive: bool,
        monitor: &mut GeofenceMonitor,
        reliability: &ReliableLocation<Arc<ScriptedSource>>,
    ) -> Vec<GeofenceEvent> {
        let mut events = Vec::new();

        loop {
            let next = self.membership_due.min(self.dwell_due);
            if next > limit || (next == limit && !inclusive) {
                break;
            }

            if self.membership_due <= self.dwell_due {
                let now = self.at(self.membership_due);
                if let Some(sample) = reliability.cached_sample() {
                    events.extend(monitor.evaluate_membership(sample.coordinate, now));
                }
                self.membership_due += self.check_interval;
            } else {
                events.extend(monitor.evaluate_dwell(self.at(self.dwell_due)));
                self.dwell_due += self.dwell_check_interval;
            }
        }

        events
    }
}
