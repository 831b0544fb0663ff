//! Replay command - play a recorded track through the monitor.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use geoguard::replay::{ReplayDriver, ReplayOptions, ReplayReport, Track};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the replay command.
pub struct ReplayArgs {
    /// CSV track file
    pub track: PathBuf,
    /// Virtual time to keep running after the last step
    pub tail: Duration,
}

/// Run the replay command.
pub fn run(runner: &CliRunner, args: ReplayArgs) -> Result<(), CliError> {
    runner.log_startup("replay");

    let track = Track::load(&args.track).map_err(|error| CliError::Track {
        path: args.track.clone(),
        error,
    })?;

    let config = runner.config().service_config();
    let options = ReplayOptions::from_service_config(&config, args.tail);
    let driver = ReplayDriver::new(config, options);

    // The replay runs on a virtual clock; a single thread is plenty
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(CliError::Runtime)?;
    let report = runtime.block_on(driver.run(runner.config().geofences.clone(), &track, None));

    print!("{}", format_report(&report));
    Ok(())
}

fn format_offset(offset: Duration) -> String {
    format!("{:>9.3}s", offset.as_secs_f64())
}

/// Render a replay report: rejected geofences, then events and issues.
pub(crate) fn format_report(report: &ReplayReport) -> String {
    let mut out = String::new();

    for rejection in &report.registration.rejected {
        let _ = writeln!(out, "Skipped geofence {}: {}", rejection.id, rejection.reason);
    }

    let _ = writeln!(
        out,
        "Replayed {} fixes against {} geofences: {} events, {} issues",
        report.fixes,
        report.registration.accepted.len(),
        report.events.len(),
        report.issues.len()
    );

    if !report.events.is_empty() {
        out.push_str("\nEvents:\n");
        for replayed in &report.events {
            let _ = writeln!(out, "  {}  {}", format_offset(replayed.offset), replayed.event);
        }
    }

    if !report.issues.is_empty() {
        out.push_str("\nIssues:\n");
        for issue in &report.issues {
            let served = issue
                .served
                .map(|source| format!("served {}", source))
                .unwrap_or_else(|| "no location".to_string());
            let _ = writeln!(
                out,
                "  {}  {}: {} ({})",
                format_offset(issue.offset),
                issue.kind,
                issue.detail,
                served
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoguard::coord::Coordinate;
    use geoguard::geofence::Geofence;
    use geoguard::service::ServiceConfig;

    async fn replay(track: &str) -> ReplayReport {
        let center = Coordinate::new(40.7128, -74.0060).unwrap();
        let config = ServiceConfig::default();
        let options = ReplayOptions::from_service_config(&config, Duration::ZERO);
        ReplayDriver::new(config, options)
            .run(
                vec![Geofence::circle("home", "Home", center, 100.0)],
                &track.parse::<Track>().unwrap(),
                None,
            )
            .await
    }

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(Duration::from_millis(70_000)), "   70.000s");
    }

    #[tokio::test]
    async fn test_report_lists_events_in_order() {
        let report = replay(
            "10000,40.7128,-74.0060\n\
             100000,40.7228,-74.0060\n",
        )
        .await;

        let out = format_report(&report);

        assert!(out.starts_with("Replayed 2 fixes against 1 geofences: 3 events, 0 issues"));
        let enter = out.find("enter home (Home)").unwrap();
        let dwell = out.find("dwell home (Home)").unwrap();
        let exit = out.find("exit home (Home)").unwrap();
        assert!(enter < dwell && dwell < exit);
        assert!(!out.contains("Issues:"));
    }

    #[tokio::test]
    async fn test_report_lists_issues() {
        let report = replay("0,error,permission denied\n").await;

        let out = format_report(&report);

        assert!(out.contains("Issues:"));
        assert!(out.contains("permission_denied: permission denied (no location)"));
    }
}
