//! Evaluation timer tasks.
//!
//! Two tokio tasks drive the monitor:
//!
//! - **membership** - wakes on every new sample and on a fallback ticker,
//!   re-evaluating every geofence against the latest sample
//! - **dwell** - wakes on a fixed ticker and refreshes visits already inside
//!
//! A pass evaluates under the monitor lock and then dispatches its events.
//! Both steps happen under a shared dispatch lock taken before the monitor
//! lock, so subscribers see events in the same order as the event log.
//! Handlers run after the monitor lock is released and may query the
//! service.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::location::LocationSample;
use crate::monitor::{EventHub, GeofenceEvent, GeofenceMonitor};
use crate::time;

const MIN_TICK: Duration = Duration::from_millis(1);

/// Owned pair of evaluation tasks.
///
/// Dropping the value cancels both tasks; [`EvaluationLoops::shutdown`]
/// also waits for them to finish.
pub(crate) struct EvaluationLoops {
    cancellation: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl EvaluationLoops {
    /// Spawn both tasks on the current runtime.
    pub(crate) fn spawn(
        monitor: Arc<Mutex<GeofenceMonitor>>,
        hub: Arc<EventHub>,
        samples: watch::Receiver<Option<LocationSample>>,
        check_interval: Duration,
        dwell_check_interval: Duration,
    ) -> Self {
        let cancellation = CancellationToken::new();
        let pass = Arc::new(Pass {
            monitor,
            hub,
            dispatch_order: Mutex::new(()),
        });

        let membership = spawn_membership_loop(
            Arc::clone(&pass),
            samples,
            cancellation.clone(),
            check_interval,
        );
        let dwell = spawn_dwell_loop(pass, cancellation.clone(), dwell_check_interval);

        tracing::debug!(
            check_interval_ms = check_interval.as_millis() as u64,
            dwell_check_interval_ms = dwell_check_interval.as_millis() as u64,
            "Evaluation loops started"
        );

        Self {
            cancellation,
            handles: vec![membership, dwell],
        }
    }

    /// Cancel both tasks and wait for them to exit.
    pub(crate) async fn shutdown(mut self) {
        self.cancellation.cancel();
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Evaluation task failed");
            }
        }
        tracing::debug!("Evaluation loops stopped");
    }
}

impl Drop for EvaluationLoops {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// Shared by both loops: one evaluation pass plus its delivery.
struct Pass {
    monitor: Arc<Mutex<GeofenceMonitor>>,
    hub: Arc<EventHub>,
    /// Held from evaluation until dispatch returns.
    dispatch_order: Mutex<()>,
}

impl Pass {
    fn run(&self, evaluate: impl FnOnce(&mut GeofenceMonitor) -> Vec<GeofenceEvent>) {
        let _order = self.dispatch_order.lock();
        let events = evaluate(&mut *self.monitor.lock());
        self.hub.dispatch(&events);
    }
}

/// Interval ticker; a zero period is clamped since tokio rejects it.
fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period.max(MIN_TICK));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn spawn_membership_loop(
    pass: Arc<Pass>,
    mut samples: watch::Receiver<Option<LocationSample>>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = new_ticker(interval);
        let mut samples_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                changed = samples.changed(), if samples_open => {
                    if changed.is_err() {
                        tracing::debug!("Sample channel closed, membership on timer only");
                        samples_open = false;
                        continue;
                    }
                }

                _ = ticker.tick() => {}
            }

            let sample = samples.borrow_and_update().clone();
            let Some(sample) = sample else {
                continue;
            };

            pass.run(|monitor| monitor.evaluate_membership(sample.coordinate, time::now()));
        }
    })
}

fn spawn_dwell_loop(
    pass: Arc<Pass>,
    cancellation: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = new_ticker(interval);

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                _ = ticker.tick() => {
                    pass.run(|monitor| monitor.evaluate_dwell(time::now()));
                }
            }
        }
    })
}
