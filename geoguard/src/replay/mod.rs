//! Deterministic replay of recorded location tracks.
//!
//! - [`Track`]: CSV track of fixes and failures
//! - [`ReplayDriver`]: plays a track through the reliability layer and the
//!   monitor on a virtual clock

mod driver;
mod track;

pub use driver::{ReplayDriver, ReplayEvent, ReplayIssue, ReplayOptions, ReplayReport};
pub use track::{Track, TrackError, TrackPoint, TrackStep};
