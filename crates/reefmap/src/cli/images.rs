//! The `reefmap images` and `reefmap stats` commands.

use clap::{Args, Subcommand};
use reefmap_core::{Config, ImageFilter, Reefmap};
use std::path::PathBuf;

/// Arguments for the `images` command.
#[derive(Args, Debug)]
pub struct ImagesArgs {
    #[command(subcommand)]
    pub command: ImagesCommand,
}

/// Subcommands for cataloged images.
#[derive(Subcommand, Debug)]
pub enum ImagesCommand {
    /// List cataloged images
    List {
        /// Case-insensitive filename substring
        #[arg(short, long)]
        search: Option<String>,

        /// Only images with coordinates
        #[arg(long)]
        with_gps: bool,
    },

    /// Show one image record
    Show { filename: String },

    /// Set coordinates by hand
    #[command(allow_negative_numbers = true)]
    TagGps {
        filename: String,
        latitude: f64,
        longitude: f64,
    },

    /// Extract a file and add or refresh its record
    Ingest { path: PathBuf },

    /// Remove an image from the catalog and drop its thumbnail
    Delete {
        filename: String,

        /// Also delete the original file
        #[arg(long)]
        remove_original: bool,
    },
}

/// Execute the images command.
pub async fn execute(args: ImagesArgs, config: Config) -> anyhow::Result<()> {
    let reefmap = Reefmap::open(config)?;
    let store = reefmap.store();

    match args.command {
        ImagesCommand::List { search, with_gps } => {
            let filter = ImageFilter {
                search,
                with_gps_only: with_gps,
            };
            super::print_json(&store.list_images(&filter)?)?;
        }

        ImagesCommand::Show { filename } => {
            super::print_json(&store.get_image(&filename)?)?;
        }

        ImagesCommand::TagGps {
            filename,
            latitude,
            longitude,
        } => {
            let record = store.tag_gps(&filename, latitude, longitude)?;
            tracing::info!("Tagged {} at ({}, {})", filename, latitude, longitude);
            super::print_json(&record)?;
        }

        ImagesCommand::Ingest { path } => {
            let record = reefmap.ingest(&path)?;
            if let Some(error) = &record.error {
                tracing::warn!("Cataloged {} with error: {}", record.filename, error);
            }
            super::print_json(&record)?;
        }

        ImagesCommand::Delete {
            filename,
            remove_original,
        } => {
            let record = reefmap.delete_image(&filename, remove_original)?;
            println!("Deleted {}", record.filename);
        }
    }

    Ok(())
}

/// Execute the stats command.
pub async fn stats(config: Config) -> anyhow::Result<()> {
    let reefmap = Reefmap::open(config)?;
    super::print_json(&reefmap.store().stats()?)
}
