//! GeoGuard CLI - Command-line interface
//!
//! This binary provides a command-line interface to the GeoGuard library:
//! writing a starter config, validating geofences, checking a coordinate
//! and replaying recorded tracks.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use geoguard::logging::LoggingOptions;

use commands::replay::ReplayArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "geoguard")]
#[command(version = geoguard::VERSION)]
#[command(about = "Geofence monitoring and location replay", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.geoguard/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    /// Mirror log output to stdout
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            stdout: self.verbose,
            debug: self.debug,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configured geofences
    Validate,

    /// Show containment and boundary distance for a coordinate
    Locate {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Replay a recorded track through the monitor
    ///
    /// Track lines are `offset_ms,lat,lon` or `offset_ms,error,<message>`.
    /// The replay runs on a virtual clock and always yields the same events.
    Replay {
        /// CSV track file
        #[arg(long)]
        track: PathBuf,

        /// Keep the clock running this long after the last step (milliseconds)
        #[arg(long, default_value = "0")]
        tail_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    let logging = cli.logging_options();

    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force),
        Commands::Validate => {
            let runner = CliRunner::new(config_path, logging)?;
            commands::validate::run(&runner)
        }
        Commands::Locate { lat, lon } => {
            let runner = CliRunner::new(config_path, logging)?;
            commands::locate::run(&runner, lat, lon)
        }
        Commands::Replay { track, tail_ms } => {
            let runner = CliRunner::new(config_path, logging)?;
            commands::replay::run(
                &runner,
                ReplayArgs {
                    track,
                    tail: Duration::from_millis(tail_ms),
                },
            )
        }
    }
}
