//! Scripted location source.
//!
//! A [`LocationSource`] that replays queued responses. Used to replay
//! recorded tracks from the CLI and as the collaborator in tests.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::coord::Coordinate;

use super::error::SourceError;
use super::source::LocationSource;

/// Message returned when the fix queue is empty.
pub const NO_FIX_MESSAGE: &str = "No recent location available";

/// Number of calls made to each collaborator operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub start: usize,
    pub stop: usize,
    pub current: usize,
    pub wait: usize,
}

impl CallCounts {
    /// Total calls across all operations.
    pub fn total(&self) -> usize {
        self.start + self.stop + self.current + self.wait
    }
}

#[derive(Default)]
struct ScriptState {
    start_results: VecDeque<Result<(), SourceError>>,
    stop_results: VecDeque<Result<(), SourceError>>,
    fixes: VecDeque<Result<Coordinate, SourceError>>,
    not_ready: bool,
    fetch_delay: Option<Duration>,
    calls: CallCounts,
}

/// Location source driven by queued responses.
///
/// - start/stop succeed unless a failure was queued for them
/// - `get_current_location` and `wait_for_location` share one fix queue;
///   an empty queue yields [`NO_FIX_MESSAGE`]
/// - an optional delay is applied before every fetch
#[derive(Default)]
pub struct ScriptedSource {
    state: Mutex<ScriptState>,
}

impl ScriptedSource {
    /// Create a ready source with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful fix.
    pub fn push_fix(&self, coordinate: Coordinate) {
        self.state.lock().fixes.push_back(Ok(coordinate));
    }

    /// Queue a failed fetch.
    pub fn push_failure(&self, error: impl Into<SourceError>) {
        self.state.lock().fixes.push_back(Err(error.into()));
    }

    /// Queue the result of the next `start_tracking` call.
    pub fn push_start_result(&self, result: Result<(), SourceError>) {
        self.state.lock().start_results.push_back(result);
    }

    /// Queue the result of the next `stop_tracking` call.
    pub fn push_stop_result(&self, result: Result<(), SourceError>) {
        self.state.lock().stop_results.push_back(result);
    }

    /// Set what `is_ready` reports.
    pub fn set_ready(&self, ready: bool) {
        self.state.lock().not_ready = !ready;
    }

    /// Delay every fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.state.lock().fetch_delay = delay;
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Fixes still queued.
    pub fn pending_fixes(&self) -> usize {
        self.state.lock().fixes.len()
    }

    async fn next_fix(&self) -> Result<Coordinate, SourceError> {
        let delay = self.state.lock().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state
            .lock()
            .fixes
            .pop_front()
            .unwrap_or_else(|| Err(SourceError::from(NO_FIX_MESSAGE)))
    }
}

impl LocationSource for ScriptedSource {
    async fn start_tracking(&self) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        state.calls.start += 1;
        state.start_results.pop_front().unwrap_or(Ok(()))
    }

    async fn stop_tracking(&self) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        state.calls.stop += 1;
        state.stop_results.pop_front().unwrap_or(Ok(()))
    }

    async fn get_current_location(&self) -> Result<Coordinate, SourceError> {
        self.state.lock().calls.current += 1;
        self.next_fix().await
    }

    async fn wait_for_location(&self, _timeout_seconds: u64) -> Result<Coordinate, SourceError> {
        self.state.lock().calls.wait += 1;
        self.next_fix().await
    }

    fn is_ready(&self) -> bool {
        !self.state.lock().not_ready
    }
}
