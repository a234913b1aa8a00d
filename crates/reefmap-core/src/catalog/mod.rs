//! Catalog persistence behind a single storage trait.
//!
//! Two interchangeable backends store the same `ImageRecord` shape: a pair
//! of JSON documents and a SQLite database. The extraction pipeline knows
//! nothing about either.

mod json;
mod sqlite;

pub use json::JsonCatalog;
pub use sqlite::SqliteCatalog;

use serde::{Deserialize, Serialize};

use crate::config::{CatalogBackend, Config};
use crate::error::{CatalogError, CatalogResult};
use crate::pipeline::gps::{self, Coordinates};
use crate::types::{CatalogStats, FavoriteLocation, ImageRecord, LocationInput, LocationPatch};

/// Filters for listing images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilter {
    /// Case-insensitive substring of the filename
    pub search: Option<String>,
    /// Only records carrying a coordinate pair
    pub with_gps_only: bool,
}

impl ImageFilter {
    /// Whether a record passes the filter.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        if self.with_gps_only && !record.has_gps() {
            return false;
        }
        match &self.search {
            Some(needle) => record
                .filename
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Storage for image records and favorite locations.
///
/// Image records are keyed by `filename`. Implementations keep insertion
/// order when listing.
pub trait CatalogStore: Send {
    /// Records matching `filter`.
    fn list_images(&self, filter: &ImageFilter) -> CatalogResult<Vec<ImageRecord>>;

    /// The record for `filename`.
    fn get_image(&self, filename: &str) -> CatalogResult<ImageRecord>;

    /// Insert a record, or replace the one with the same filename.
    fn upsert_image(&self, record: &ImageRecord) -> CatalogResult<()>;

    /// Replace the whole image collection.
    fn replace_images(&self, records: &[ImageRecord]) -> CatalogResult<()>;

    /// Override coordinates by hand and mark the record as manually tagged.
    fn tag_gps(&self, filename: &str, latitude: f64, longitude: f64)
        -> CatalogResult<ImageRecord>;

    /// Remove and return the record for `filename`.
    fn delete_image(&self, filename: &str) -> CatalogResult<ImageRecord>;

    /// Aggregate counts.
    fn stats(&self) -> CatalogResult<CatalogStats>;

    /// All favorite locations.
    fn list_locations(&self) -> CatalogResult<Vec<FavoriteLocation>>;

    /// Store a new favorite location.
    fn create_location(&self, input: LocationInput) -> CatalogResult<FavoriteLocation>;

    /// Apply a partial update to a favorite location.
    fn update_location(&self, id: &str, patch: &LocationPatch) -> CatalogResult<FavoriteLocation>;

    /// Remove a favorite location.
    fn delete_location(&self, id: &str) -> CatalogResult<()>;
}

/// Open the backend selected in `config`, creating it if needed.
pub fn open_catalog(config: &Config) -> CatalogResult<Box<dyn CatalogStore>> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let store: Box<dyn CatalogStore> = match config.catalog.backend {
        CatalogBackend::Json => Box::new(JsonCatalog::new(
            data_dir.join(&config.catalog.images_file),
            data_dir.join(&config.catalog.locations_file),
        )),
        CatalogBackend::Sqlite => Box::new(SqliteCatalog::open(
            &data_dir.join(&config.catalog.database_file),
        )?),
    };
    tracing::debug!("Opened {:?} catalog in {:?}", config.catalog.backend, data_dir);
    Ok(store)
}

/// Coordinates for a manual tag: same gate as extraction.
pub(crate) fn manual_coordinates(latitude: f64, longitude: f64) -> CatalogResult<Coordinates> {
    gps::validate_pair(latitude, longitude)
        .map_err(|_| CatalogError::InvalidCoordinates { latitude, longitude })
}

/// Range check for favorite locations.
pub(crate) fn check_location(latitude: f64, longitude: f64) -> CatalogResult<()> {
    let in_range = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    if in_range {
        Ok(())
    } else {
        Err(CatalogError::InvalidCoordinates { latitude, longitude })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let filter = ImageFilter {
            search: Some("NUDI".into()),
            with_gps_only: false,
        };
        assert!(filter.matches(&ImageRecord::new("blue_nudibranch.jpg", "/x")));
        assert!(!filter.matches(&ImageRecord::new("turtle.jpg", "/x")));
    }

    #[test]
    fn test_filter_gps_only() {
        let filter = ImageFilter {
            search: None,
            with_gps_only: true,
        };
        let mut record = ImageRecord::new("turtle.jpg", "/x");
        assert!(!filter.matches(&record));
        record.set_coordinates(Coordinates {
            latitude: 16.0,
            longitude: 108.0,
        });
        assert!(filter.matches(&record));
    }

    #[test]
    fn test_manual_coordinates_gate() {
        assert!(manual_coordinates(16.1, 108.2).is_ok());
        assert!(manual_coordinates(0.0, 0.0).is_err());
        assert!(manual_coordinates(91.0, 0.5).is_err());
        assert!(manual_coordinates(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_check_location_range() {
        assert!(check_location(0.0, 0.0).is_ok());
        assert!(check_location(-90.0, 180.0).is_ok());
        assert!(check_location(-90.5, 10.0).is_err());
        assert!(check_location(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_open_catalog_backends() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.general.data_dir = dir.path().join("data");

        let store = open_catalog(&config).unwrap();
        assert_eq!(store.stats().unwrap().total_images, 0);

        config.catalog.backend = CatalogBackend::Sqlite;
        let store = open_catalog(&config).unwrap();
        assert_eq!(store.stats().unwrap().total_images, 0);
        assert!(dir.path().join("data").join("reefmap.db").exists());
    }
}
