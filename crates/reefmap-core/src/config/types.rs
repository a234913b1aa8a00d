//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the original photographs
    pub images_dir: PathBuf,

    /// Directory holding catalog documents / database
    pub data_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("~/.reefmap/fishes"),
            data_dir: PathBuf::from("~/.reefmap/data"),
        }
    }
}

/// Directory scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions picked up by a directory scan (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Sort records by filename instead of keeping directory order
    pub sort_by_name: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "heic".to_string(),
            ],
            sort_by_name: false,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
        }
    }
}

/// Thumbnail cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Directory where rendered thumbnails are cached
    pub dir: PathBuf,

    /// Bounding box edge in pixels (applies to both dimensions)
    pub max_size: u32,

    /// JPEG quality (1-100)
    pub quality: u8,

    /// Prefix prepended to the original filename
    pub prefix: String,

    /// Max-age advertised to downstream HTTP caches
    pub cache_max_age_secs: u64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/.reefmap/thumbnails"),
            max_size: 400,
            quality: 85,
            prefix: "thumb_".to_string(),
            cache_max_age_secs: 86_400,
        }
    }
}

/// Which persistence backend holds the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackend {
    /// Flat JSON documents
    #[default]
    Json,
    /// SQLite database
    Sqlite,
}

/// Catalog storage settings. File names are relative to `general.data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Backend selection
    pub backend: CatalogBackend,

    /// Image records document (json backend)
    pub images_file: String,

    /// Favorite locations document (json backend)
    pub locations_file: String,

    /// Database file (sqlite backend)
    pub database_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::Json,
            images_file: "images_metadata.json".to_string(),
            locations_file: "locations.json".to_string(),
            database_file: "reefmap.db".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
