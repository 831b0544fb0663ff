//! Time helpers shared by the location layer and the monitor.
//!
//! All timestamps in this crate are monotonic [`Instant`]s read through
//! [`now`], which goes via tokio's clock. Under a paused test runtime
//! (`#[tokio::test(start_paused = true)]`) that clock only moves when the
//! test advances it, which makes timer-driven behaviour deterministic.

use std::time::{Instant, SystemTime};

/// Current monotonic time as seen by the tokio clock.
#[inline]
pub fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Convert a `SystemTime` to an `Instant`.
///
/// This is approximate since `Instant` doesn't have a fixed epoch.
/// The conversion calculates elapsed time from the `SystemTime` to now,
/// then subtracts that from the current `Instant`.
///
/// # Returns
///
/// `Some(Instant)` if the conversion succeeds, `None` if the resulting
/// instant would be before the process start (underflow).
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
/// use geoguard::time::system_time_to_instant;
///
/// let fix_time = SystemTime::now();
/// if let Some(instant) = system_time_to_instant(fix_time) {
///     println!("Fix was taken {:?} ago", instant.elapsed());
/// }
/// ```
pub fn system_time_to_instant(system_time: SystemTime) -> Option<Instant> {
    let now_system = SystemTime::now();
    let now_instant = now();

    match now_system.duration_since(system_time) {
        Ok(elapsed) => now_instant.checked_sub(elapsed),
        Err(_) => Some(now_instant), // Future time, use now
    }
}
