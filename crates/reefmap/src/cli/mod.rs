//! Command handlers. Each module owns one top-level subcommand.

pub mod config;
pub mod extract;
pub mod images;
pub mod locations;
pub mod scan;
pub mod thumbnail;

use reefmap_core::{Config, ConfigError};
use std::path::Path;

/// Load configuration from an explicit file, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
