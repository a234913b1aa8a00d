//! Document-store backend: two pretty-printed JSON arrays on disk.
//!
//! Documents are re-read on every call, so edits made by another process
//! are picked up. Writes go through a temp file and rename.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, CatalogResult};
use crate::types::{CatalogStats, FavoriteLocation, ImageRecord, LocationInput, LocationPatch};

use super::{check_location, manual_coordinates, CatalogStore, ImageFilter};

/// Catalog stored as `images_metadata.json` / `locations.json` style files.
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    images_path: PathBuf,
    locations_path: PathBuf,
}

impl JsonCatalog {
    pub fn new(images_path: PathBuf, locations_path: PathBuf) -> Self {
        Self {
            images_path,
            locations_path,
        }
    }

    fn load_images(&self) -> CatalogResult<Vec<ImageRecord>> {
        let mut records: Vec<ImageRecord> = load_document(&self.images_path)?;
        records.iter_mut().for_each(ImageRecord::normalize_coordinates);
        Ok(records)
    }

    fn save_images(&self, records: &[ImageRecord]) -> CatalogResult<()> {
        save_document(&self.images_path, records)
    }

    fn load_locations(&self) -> CatalogResult<Vec<FavoriteLocation>> {
        load_document(&self.locations_path)
    }

    fn save_locations(&self, locations: &[FavoriteLocation]) -> CatalogResult<()> {
        save_document(&self.locations_path, locations)
    }
}

impl CatalogStore for JsonCatalog {
    fn list_images(&self, filter: &ImageFilter) -> CatalogResult<Vec<ImageRecord>> {
        let mut records = self.load_images()?;
        records.retain(|r| filter.matches(r));
        Ok(records)
    }

    fn get_image(&self, filename: &str) -> CatalogResult<ImageRecord> {
        self.load_images()?
            .into_iter()
            .find(|r| r.filename == filename)
            .ok_or_else(|| CatalogError::ImageNotFound(filename.to_string()))
    }

    fn upsert_image(&self, record: &ImageRecord) -> CatalogResult<()> {
        let mut records = self.load_images()?;
        match records.iter_mut().find(|r| r.filename == record.filename) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.save_images(&records)
    }

    fn replace_images(&self, records: &[ImageRecord]) -> CatalogResult<()> {
        self.save_images(records)
    }

    fn tag_gps(
        &self,
        filename: &str,
        latitude: f64,
        longitude: f64,
    ) -> CatalogResult<ImageRecord> {
        let coordinates = manual_coordinates(latitude, longitude)?;
        let mut records = self.load_images()?;
        let record = records
            .iter_mut()
            .find(|r| r.filename == filename)
            .ok_or_else(|| CatalogError::ImageNotFound(filename.to_string()))?;
        if record.error.is_some() {
            return Err(CatalogError::UnreadableImage(filename.to_string()));
        }
        record.set_coordinates(coordinates);
        record.manually_tagged = true;
        let updated = record.clone();
        self.save_images(&records)?;
        Ok(updated)
    }

    fn delete_image(&self, filename: &str) -> CatalogResult<ImageRecord> {
        let mut records = self.load_images()?;
        let index = records
            .iter()
            .position(|r| r.filename == filename)
            .ok_or_else(|| CatalogError::ImageNotFound(filename.to_string()))?;
        let removed = records.remove(index);
        self.save_images(&records)?;
        Ok(removed)
    }

    fn stats(&self) -> CatalogResult<CatalogStats> {
        Ok(CatalogStats::from_records(&self.load_images()?))
    }

    fn list_locations(&self) -> CatalogResult<Vec<FavoriteLocation>> {
        self.load_locations()
    }

    fn create_location(&self, input: LocationInput) -> CatalogResult<FavoriteLocation> {
        check_location(input.latitude, input.longitude)?;
        let location = FavoriteLocation {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            latitude: input.latitude,
            longitude: input.longitude,
            description: input.description,
            created_at: Utc::now(),
        };
        let mut locations = self.load_locations()?;
        locations.push(location.clone());
        self.save_locations(&locations)?;
        Ok(location)
    }

    fn update_location(&self, id: &str, patch: &LocationPatch) -> CatalogResult<FavoriteLocation> {
        let mut locations = self.load_locations()?;
        let location = locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| CatalogError::LocationNotFound(id.to_string()))?;
        let mut updated = location.clone();
        patch.apply(&mut updated);
        check_location(updated.latitude, updated.longitude)?;
        *location = updated.clone();
        self.save_locations(&locations)?;
        Ok(updated)
    }

    fn delete_location(&self, id: &str) -> CatalogResult<()> {
        let mut locations = self.load_locations()?;
        let before = locations.len();
        locations.retain(|l| l.id != id);
        if locations.len() == before {
            return Err(CatalogError::LocationNotFound(id.to_string()));
        }
        self.save_locations(&locations)
    }
}

/// Read a JSON array; a missing file is an empty collection.
fn load_document<T: DeserializeOwned>(path: &Path) -> CatalogResult<Vec<T>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn save_document<T: Serialize>(path: &Path, items: &[T]) -> CatalogResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, items)?;
    writeln!(tmp)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
