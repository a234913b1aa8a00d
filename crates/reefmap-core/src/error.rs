//! Error types for the reefmap catalog.
//!
//! Errors are organized by concern. Extraction never surfaces its errors to
//! callers (they are folded into `ImageRecord::error`), while thumbnail and
//! catalog errors propagate so the calling transport can map them to a
//! client-visible or server-visible failure.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for reefmap operations.
#[derive(Error, Debug)]
pub enum ReefmapError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Metadata pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Thumbnail cache errors
    #[error("Thumbnail error: {0}")]
    Thumbnail(#[from] ThumbnailError),

    /// Catalog storage errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while reading an image for metadata extraction.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image could not be opened or decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Header does not match any known image container
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Directory could not be enumerated
    #[error("Cannot read directory {path}: {message}")]
    Directory { path: PathBuf, message: String },
}

/// Thumbnail cache errors.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// The original image does not exist
    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    /// Decoding the original or encoding the rendition failed
    #[error("Failed to generate thumbnail for {path}: {message}")]
    Generation { path: PathBuf, message: String },

    /// Reading or writing the cache directory failed
    #[error("Thumbnail cache IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ThumbnailError {
    /// True when the failure is the caller's fault (missing original).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ThumbnailError::NotFound(_))
    }
}

/// Catalog storage errors, shared by every backend.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Reading or writing a catalog document failed
    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog document is not valid JSON
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Relational backend failure
    #[error("Catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No image with this filename is cataloged
    #[error("Image not found in catalog: {0}")]
    ImageNotFound(String),

    /// The image failed extraction, so it cannot carry coordinates
    #[error("Cannot tag unreadable image: {0}")]
    UnreadableImage(String),

    /// No favorite location with this id
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Coordinate pair failed validation
    #[error("Invalid coordinates: ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// Convenience type alias for reefmap results.
pub type Result<T> = std::result::Result<T, ReefmapError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for catalog results.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = ThumbnailError::NotFound(PathBuf::from("/fishes/nemo.jpg"));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nemo.jpg"));

        let err = ThumbnailError::Generation {
            path: PathBuf::from("/fishes/nemo.jpg"),
            message: "truncated".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_catalog_error_wraps_into_top_level() {
        let err: ReefmapError = CatalogError::ImageNotFound("nemo.jpg".into()).into();
        assert!(err.to_string().contains("Image not found in catalog: nemo.jpg"));
    }
}
