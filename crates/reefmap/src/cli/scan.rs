//! The `reefmap scan` command.

use clap::Args;
use reefmap_core::{Config, Reefmap};
use std::path::PathBuf;

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Originals directory (defaults to `general.images_dir`)
    pub dir: Option<PathBuf>,
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(dir) = args.dir {
        config.general.images_dir = dir;
    }
    tracing::info!("Scanning {:?}", config.images_dir());

    let report = tokio::task::spawn_blocking(move || {
        let reefmap = Reefmap::open(config)?;
        reefmap.reprocess()
    })
    .await??;

    let stats = &report.stats;
    if stats.gps_rejected > 0 || stats.gps_malformed > 0 {
        tracing::warn!(
            "{} images had unusable GPS ({} rejected, {} malformed)",
            stats.gps_rejected + stats.gps_malformed,
            stats.gps_rejected,
            stats.gps_malformed
        );
    }
    super::print_json(stats)
}
