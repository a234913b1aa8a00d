//! Metadata extraction: dimensions, camera tags and validated GPS.
//!
//! Extraction never fails past its boundary. An image that cannot be
//! decoded yields a record carrying only `filename`, `path` and `error`.

use exif::{In, Reader, Tag};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::types::ImageRecord;

use super::discovery::FileDiscovery;
use super::gps::{self, GpsOutcome};
use super::validate::Validator;

/// Camera tags copied verbatim into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraField {
    Make,
    Model,
    DateTime,
    DateTimeOriginal,
}

/// EXIF tag for each catalog field.
pub const CAMERA_TAGS: [(Tag, CameraField); 4] = [
    (Tag::Make, CameraField::Make),
    (Tag::Model, CameraField::Model),
    (Tag::DateTime, CameraField::DateTime),
    (Tag::DateTimeOriginal, CameraField::DateTimeOriginal),
];

impl CameraField {
    fn slot(self, record: &mut ImageRecord) -> &mut Option<String> {
        match self {
            CameraField::Make => &mut record.make,
            CameraField::Model => &mut record.model,
            CameraField::DateTime => &mut record.datetime,
            CameraField::DateTimeOriginal => &mut record.datetimeoriginal,
        }
    }
}

/// A record plus how its GPS derivation went.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ImageRecord,
    pub gps: GpsOutcome,
}

/// Counters for a directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files examined
    pub total: usize,
    /// Records with an accepted coordinate pair
    pub with_gps: usize,
    /// Records without coordinates (including failures)
    pub without_gps: usize,
    /// Files that could not be decoded
    pub failed: usize,
    /// Coordinates dropped by the validation gate
    pub gps_rejected: usize,
    /// GPS blocks with missing or malformed tuples
    pub gps_malformed: usize,
}

impl ScanStats {
    fn record(&mut self, extraction: &Extraction) {
        self.total += 1;
        if extraction.record.error.is_some() {
            self.failed += 1;
        }
        match extraction.gps {
            GpsOutcome::Accepted(_) => self.with_gps += 1,
            GpsOutcome::Rejected(_) => self.gps_rejected += 1,
            GpsOutcome::Malformed => self.gps_malformed += 1,
            GpsOutcome::Absent => {}
        }
        if !extraction.record.has_gps() {
            self.without_gps += 1;
        }
    }
}

/// Output of a directory scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub records: Vec<ImageRecord>,
    pub stats: ScanStats,
}

/// Extracts catalog records from image files.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    validator: Validator,
    discovery: FileDiscovery,
}

impl MetadataExtractor {
    /// Create an extractor from the scan and limits configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.scan.clone()),
        }
    }

    /// Extract a record from a single image.
    pub fn extract(&self, path: &Path) -> ImageRecord {
        self.extract_detailed(path).record
    }

    /// Extract a record and report the GPS outcome alongside it.
    pub fn extract_detailed(&self, path: &Path) -> Extraction {
        let start = std::time::Instant::now();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let display_path = std::path::absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned();

        let extraction = match self.read(path, ImageRecord::new(&filename, &display_path)) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!("Error extracting metadata from {:?}: {}", path, e);
                Extraction {
                    record: ImageRecord::failed(filename, display_path, e.to_string()),
                    gps: GpsOutcome::Absent,
                }
            }
        };

        if let GpsOutcome::Rejected(reason) = extraction.gps {
            tracing::warn!("Dropped GPS for {:?}: {:?}", path, reason);
        }
        tracing::trace!("  Metadata: {:?} in {:?}", path, start.elapsed());
        extraction
    }

    /// Extract every supported image directly inside `dir`.
    ///
    /// One unreadable image never aborts the scan; it shows up as an error
    /// record and in `stats.failed`.
    pub fn process_directory(&self, dir: &Path) -> PipelineResult<ScanReport> {
        let files = self.discovery.discover(dir)?;
        tracing::debug!("Found {} candidate images in {:?}", files.len(), dir);

        let mut report = ScanReport::default();
        for file in &files {
            tracing::debug!("Processing: {:?}", file);
            let extraction = self.extract_detailed(file);
            report.stats.record(&extraction);
            report.records.push(extraction.record);
        }

        tracing::info!(
            "Processed {} images ({} with GPS, {} failed)",
            report.stats.total,
            report.stats.with_gps,
            report.stats.failed
        );
        Ok(report)
    }

    fn read(&self, path: &Path, mut record: ImageRecord) -> PipelineResult<Extraction> {
        self.validator.validate(path)?;

        let (width, height) = read_dimensions(path)?;
        record.width = Some(width);
        record.height = Some(height);

        let mut gps = GpsOutcome::Absent;
        if let Some(exif) = read_exif(path) {
            for (tag, field) in CAMERA_TAGS {
                if let Some(value) = exif
                    .get_field(tag, In::PRIMARY)
                    .and_then(|f| gps::ascii_value(&f.value))
                {
                    *field.slot(&mut record) = Some(value);
                }
            }
            if let Some(fields) = gps::read_gps_fields(&exif) {
                gps = gps::resolve(&fields);
            }
        }

        if let Some(coordinates) = gps.coordinates() {
            record.set_coordinates(coordinates);
        }
        Ok(Extraction { record, gps })
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Pixel dimensions read from the container header.
fn read_dimensions(path: &Path) -> PipelineResult<(u32, u32)> {
    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };
    let (width, height) = image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?
        .into_dimensions()
        .map_err(|e| decode_err(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(decode_err(format!("Degenerate dimensions {}x{}", width, height)));
    }
    Ok((width, height))
}

/// Parsed EXIF block, or `None` if the image has none or it is unreadable.
fn read_exif(path: &Path) -> Option<exif::Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Some(exif),
        Err(exif::Error::NotFound(_)) => None,
        Err(e) => {
            tracing::debug!("Ignoring unreadable EXIF in {:?}: {}", path, e);
            None
        }
    }
}
