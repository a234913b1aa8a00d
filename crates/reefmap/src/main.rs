//! Reefmap CLI - operator tool for the marine-life photo catalog.
//!
//! Wires configuration, logging and a catalog backend to `reefmap-core`.
//! Every command is a thin call into the library.
//!
//! # Usage
//!
//! ```bash
//! # Rescan the originals directory into the catalog
//! reefmap scan
//!
//! # Print metadata for a file or directory without touching the catalog
//! reefmap extract ./fishes/ --format jsonl
//!
//! # Render (or reuse) a thumbnail
//! reefmap thumbnail turtle.jpg --output turtle_small.jpg
//!
//! # Tag an image by hand
//! reefmap images tag-gps turtle.jpg 16.0544 108.2022
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Reefmap - catalog geotagged marine-life photographs.
#[derive(Parser, Debug)]
#[command(name = "reefmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "REEFMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rescan the originals directory and replace the image catalog
    Scan(cli::scan::ScanArgs),

    /// Extract metadata from a file or directory and print it
    Extract(cli::extract::ExtractArgs),

    /// Get a cached thumbnail, rendering it if stale
    Thumbnail(cli::thumbnail::ThumbnailArgs),

    /// Browse and edit cataloged images
    Images(cli::images::ImagesArgs),

    /// Show catalog statistics
    Stats,

    /// Manage favorite locations
    Locations(cli::locations::LocationsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `reefmap config path`."
            );
            reefmap_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Reefmap v{}", reefmap_core::VERSION);

    match cli.command {
        Commands::Scan(args) => cli::scan::execute(args, config).await,
        Commands::Extract(args) => cli::extract::execute(args, config).await,
        Commands::Thumbnail(args) => cli::thumbnail::execute(args, config).await,
        Commands::Images(args) => cli::images::execute(args, config).await,
        Commands::Stats => cli::images::stats(config).await,
        Commands::Locations(args) => cli::locations::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
