//! Init command - write a default configuration file.

use std::path::Path;

use waypost::config::ConfigFile;

use crate::error::CliError;

/// Run the init command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => ConfigFile::default_path().ok_or_else(|| {
            CliError::Config(
                "no config directory on this platform; pass --config".to_string(),
            )
        })?,
    };

    if path.exists() {
        println!("Configuration file already exists: {}", path.display());
        println!("Delete it first if you want a fresh default.");
        return Ok(());
    }

    ConfigFile::write_default(&path)?;
    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to point catalog.path at your places JSON");
    println!("and to customize routing and refresh behavior.");
    Ok(())
}
