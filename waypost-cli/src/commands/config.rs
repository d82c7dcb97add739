//! Config command - show the effective configuration.

use std::path::Path;

use console::style;

use waypost::config::ConfigFile;
use waypost::provider::DurationPolicy;

use crate::error::CliError;

use super::common;

/// Run the config command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = common::load_config(config_path)?;

    let file = config_path
        .map(Path::to_path_buf)
        .or_else(ConfigFile::default_path);
    match file {
        Some(path) if path.exists() => println!("config file: {}", path.display()),
        Some(path) => println!("config file: {} {}", path.display(), style("(not found, using defaults)").dim()),
        None => println!("config file: {}", style("(none)").dim()),
    }
    println!();

    println!("[catalog]");
    match &config.catalog_path {
        Some(path) => println!("  path = {}", path.display()),
        None => println!("  path = {}", style("(not set)").dim()),
    }
    println!();

    println!("[routing]");
    println!("  provider = {}", config.provider.name());
    match config.duration_policy {
        DurationPolicy::FromProvider => println!("  duration = provider"),
        DurationPolicy::FixedPace { walking_speed_mps } => {
            println!("  duration = fixed-pace");
            println!("  walking_speed = {} m/s", walking_speed_mps);
        }
    }
    println!();

    let engine = &config.engine;
    println!("[engine]");
    println!("  movement_threshold_m = {}", engine.movement_threshold_m);
    println!("  refresh_interval_secs = {}", engine.refresh_interval.as_secs());
    println!("  staleness_secs = {}", engine.staleness_window.as_secs());
    println!("  batch_size = {}", engine.batch_size);
    println!("  batch_delay_ms = {}", engine.batch_delay.as_millis());
    println!(
        "  status_clear_delay_secs = {}",
        engine.status_clear_delay.as_secs()
    );
    Ok(())
}
