//! Core data types for the reefmap catalog.
//!
//! `ImageRecord` is the flat output of metadata extraction and the unit both
//! catalog backends store. Optional fields are omitted from JSON rather than
//! written as `null`, so field presence survives a round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::gps::Coordinates;

/// Metadata extracted from a single photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    // === File Identification ===
    /// Basename of the source file, unique across the catalog
    pub filename: String,

    /// Absolute path to the source file (informational)
    pub path: String,

    // === Image Properties ===
    /// Image width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    // === Camera Tags ===
    /// Camera manufacturer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,

    /// Camera model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Last modification time, camera-native `YYYY:MM:DD HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Capture time, camera-native `YYYY:MM:DD HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetimeoriginal: Option<String>,

    // === Location ===
    /// Decimal degrees, always paired with `longitude`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Decimal degrees, always paired with `latitude`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Set only when a person overrides the coordinates
    #[serde(default, skip_serializing_if = "is_false")]
    pub manually_tagged: bool,

    /// Why the image could not be read; geometry and GPS are absent when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ImageRecord {
    /// A record with identity only, to be filled in by the extractor.
    pub fn new(filename: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            width: None,
            height: None,
            make: None,
            model: None,
            datetime: None,
            datetimeoriginal: None,
            latitude: None,
            longitude: None,
            manually_tagged: false,
            error: None,
        }
    }

    /// A record for an image that could not be decoded.
    pub fn failed(
        filename: impl Into<String>,
        path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(filename, path)
        }
    }

    /// The coordinate pair, if both halves are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Whether the record carries a coordinate pair.
    pub fn has_gps(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Store both halves of a coordinate pair at once.
    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
    }

    /// Drop a half-populated pair left behind by an external writer.
    pub fn normalize_coordinates(&mut self) {
        if self.coordinates().is_none() {
            self.latitude = None;
            self.longitude = None;
        }
    }
}

/// A user-curated dive or snorkel spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    /// Stable identifier (UUID v4)
    pub id: String,

    /// Display name
    pub name: String,

    /// Decimal degrees
    pub latitude: f64,

    /// Decimal degrees
    pub longitude: f64,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the location was created
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a favorite location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a favorite location; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl LocationPatch {
    /// Apply the patch on top of an existing location.
    pub fn apply(&self, location: &mut FavoriteLocation) {
        if let Some(name) = &self.name {
            location.name = name.clone();
        }
        if let Some(latitude) = self.latitude {
            location.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            location.longitude = longitude;
        }
        if let Some(description) = &self.description {
            location.description = Some(description.clone());
        }
    }
}

/// Aggregate counts over the stored catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_images: usize,
    pub images_with_gps: usize,
    pub images_without_gps: usize,
    pub images_with_errors: usize,
}

impl CatalogStats {
    /// Count over a slice of records.
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let total_images = records.len();
        let images_with_gps = records.iter().filter(|r| r.has_gps()).count();
        let images_with_errors = records.iter().filter(|r| r.error.is_some()).count();
        Self {
            total_images,
            images_with_gps,
            images_without_gps: total_images - images_with_gps,
            images_with_errors,
        }
    }
}
