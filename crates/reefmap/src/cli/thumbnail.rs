//! The `reefmap thumbnail` command.

use clap::Args;
use reefmap_core::{Config, ThumbnailCache};
use std::path::PathBuf;

/// Arguments for the `thumbnail` command.
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Filename of an original inside `general.images_dir`
    pub filename: String,

    /// Copy the JPEG bytes here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the thumbnail command.
pub async fn execute(args: ThumbnailArgs, config: Config) -> anyhow::Result<()> {
    let cache = ThumbnailCache::from_config(&config);
    let thumbnail = cache.get_async(&args.filename).await?;

    tracing::info!(
        "{} thumbnail for {} ({} bytes, Cache-Control: {})",
        if thumbnail.regenerated { "Rendered" } else { "Reused" },
        args.filename,
        thumbnail.bytes.len(),
        thumbnail.cache_control
    );

    match args.output {
        Some(path) => tokio::fs::write(&path, &thumbnail.bytes).await?,
        None => println!("{}", thumbnail.path.display()),
    }
    Ok(())
}
