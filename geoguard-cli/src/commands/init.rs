//! Init command - write a default, commented configuration file.

use std::path::Path;

use geoguard::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Run the init command.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    write_default_config(&path, force)?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Add geofences as [geofence.<id>] sections, then check them with:");
    println!("  geoguard validate");
    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }
    ConfigFile::default().save_to(path)?;
    Ok(())
}
