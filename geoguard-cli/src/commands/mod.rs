//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`init`] - Write a default configuration file
//! - [`locate`] - Containment check for a single coordinate
//! - [`replay`] - Deterministic replay of a recorded track
//! - [`validate`] - Geofence validation report

pub mod init;
pub mod locate;
pub mod replay;
pub mod validate;
