//! Reefmap Core - metadata extraction and thumbnail caching for a
//! marine-life photo catalog.
//!
//! The library turns image files into flat `ImageRecord`s (dimensions,
//! camera tags and validated decimal GPS coordinates) and serves bounded
//! JPEG thumbnails from an mtime-checked disk cache. Storage sits behind the
//! `CatalogStore` trait with a JSON document backend and a SQLite backend.
//!
//! # Architecture
//!
//! ```text
//! File → Validate → Dimensions → EXIF tags → GPS gate → ImageRecord → CatalogStore
//!                                                       ThumbnailCache ↗ (by filename)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use reefmap_core::{Config, Reefmap};
//!
//! fn main() -> reefmap_core::Result<()> {
//!     let reefmap = Reefmap::open(Config::load()?)?;
//!     let report = reefmap.reprocess()?;
//!     println!("{} images, {} with GPS", report.stats.total, report.stats.with_gps);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

use std::collections::HashMap;
use std::path::Path;

// Re-exports for convenient access
pub use catalog::{open_catalog, CatalogStore, ImageFilter, JsonCatalog, SqliteCatalog};
pub use config::Config;
pub use error::{
    CatalogError, CatalogResult, ConfigError, PipelineError, PipelineResult, ReefmapError, Result,
    ThumbnailError,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{
    Coordinates, Extraction, GpsOutcome, MetadataExtractor, ScanReport, ScanStats, Thumbnail,
    ThumbnailCache,
};
pub use types::{CatalogStats, FavoriteLocation, ImageRecord, LocationInput, LocationPatch};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extractor, thumbnail cache and catalog wired from one configuration.
///
/// This is what the upload and reprocess flows call into: it owns no state
/// beyond the three collaborators.
pub struct Reefmap {
    config: Config,
    extractor: MetadataExtractor,
    thumbnails: ThumbnailCache,
    store: Box<dyn CatalogStore>,
}

impl Reefmap {
    /// Open the configured catalog backend and build the pipeline.
    pub fn open(config: Config) -> Result<Self> {
        let store = open_catalog(&config)?;
        Ok(Self::with_store(config, store))
    }

    /// Use an already-open store.
    pub fn with_store(config: Config, store: Box<dyn CatalogStore>) -> Self {
        tracing::debug!("Initializing reefmap v{}", VERSION);
        Self {
            extractor: MetadataExtractor::new(&config),
            thumbnails: ThumbnailCache::from_config(&config),
            config,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn extractor(&self) -> &MetadataExtractor {
        &self.extractor
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Rescan the originals directory and replace the image catalog.
    ///
    /// Coordinates set by hand survive a rescan unless the file now carries
    /// accepted GPS of its own.
    pub fn reprocess(&self) -> Result<ScanReport> {
        let mut report = self.extractor.process_directory(&self.config.images_dir())?;

        let manual: HashMap<String, Coordinates> = self
            .store
            .list_images(&ImageFilter::default())?
            .into_iter()
            .filter(|r| r.manually_tagged)
            .filter_map(|r| r.coordinates().map(|c| (r.filename, c)))
            .collect();

        for record in &mut report.records {
            if record.has_gps() || record.error.is_some() {
                continue;
            }
            if let Some(coordinates) = manual.get(&record.filename) {
                record.set_coordinates(*coordinates);
                record.manually_tagged = true;
            }
        }

        self.store.replace_images(&report.records)?;
        tracing::info!("Catalog now holds {} images", report.records.len());
        Ok(report)
    }

    /// Extract one image and upsert its record.
    pub fn ingest(&self, path: &Path) -> Result<ImageRecord> {
        let record = self.extractor.extract(path);
        self.store.upsert_image(&record)?;
        Ok(record)
    }

    /// Remove an image from the catalog along with its cached thumbnail,
    /// and optionally the original file.
    pub fn delete_image(&self, filename: &str, remove_original: bool) -> Result<ImageRecord> {
        let record = self.store.delete_image(filename)?;
        if self.thumbnails.invalidate(filename)? {
            tracing::debug!("Removed cached thumbnail for {}", filename);
        }
        if remove_original {
            let original = self.config.images_dir().join(&record.filename);
            match std::fs::remove_file(&original) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!("Original already gone: {:?}", original);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(record)
    }
}
