//! Image processing pipeline components.
//!
//! - **validate**: Pre-decode size and signature checks
//! - **discovery**: Find candidate images in a directory
//! - **rational**: EXIF rationals with the zero-denominator policy
//! - **gps**: DMS conversion, hemisphere sign and the validation gate
//! - **metadata**: Per-image and per-directory record extraction
//! - **thumbnail**: Bounded JPEG renditions cached by mtime

pub mod discovery;
pub mod gps;
pub mod metadata;
pub mod rational;
pub mod thumbnail;
pub mod validate;

// Re-exports for convenient access
pub use discovery::FileDiscovery;
pub use gps::{Coordinates, GpsFields, GpsOutcome, Rejection};
pub use metadata::{Extraction, MetadataExtractor, ScanReport, ScanStats};
pub use rational::Rational;
pub use thumbnail::{Thumbnail, ThumbnailCache};
pub use validate::{Container, Validator};
