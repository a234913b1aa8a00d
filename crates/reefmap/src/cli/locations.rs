//! The `reefmap locations` command for favorite dive spots.

use clap::{Args, Subcommand};
use reefmap_core::{open_catalog, Config, LocationInput, LocationPatch};

/// Arguments for the `locations` command.
#[derive(Args, Debug)]
pub struct LocationsArgs {
    #[command(subcommand)]
    pub command: LocationsCommand,
}

/// Subcommands for favorite locations.
#[derive(Subcommand, Debug)]
pub enum LocationsCommand {
    /// List favorite locations
    List,

    /// Add a favorite location
    #[command(allow_negative_numbers = true)]
    Add {
        name: String,
        latitude: f64,
        longitude: f64,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Change fields of a favorite location
    #[command(allow_negative_numbers = true)]
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        latitude: Option<f64>,

        #[arg(long)]
        longitude: Option<f64>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a favorite location
    Remove { id: String },
}

/// Execute the locations command.
pub async fn execute(args: LocationsArgs, config: Config) -> anyhow::Result<()> {
    let store = open_catalog(&config)?;

    match args.command {
        LocationsCommand::List => super::print_json(&store.list_locations()?)?,

        LocationsCommand::Add {
            name,
            latitude,
            longitude,
            description,
        } => {
            let location = store.create_location(LocationInput {
                name,
                latitude,
                longitude,
                description,
            })?;
            super::print_json(&location)?;
        }

        LocationsCommand::Update {
            id,
            name,
            latitude,
            longitude,
            description,
        } => {
            let patch = LocationPatch {
                name,
                latitude,
                longitude,
                description,
            };
            super::print_json(&store.update_location(&id, &patch)?)?;
        }

        LocationsCommand::Remove { id } => {
            store.delete_location(&id)?;
            println!("Removed location {}", id);
        }
    }

    Ok(())
}
