//! Bounded JPEG renditions cached on disk, invalidated by mtime.
//!
//! An artifact is reused iff its modification time is at least the
//! original's. Artifacts are rendered fully in memory, written to a temp
//! file in the cache directory and renamed into place, so readers never see
//! a truncated file and concurrent writers simply race to the last rename.

use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage, Rgba};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::{Config, ThumbnailConfig};
use crate::error::ThumbnailError;

/// Widest timestamp granularity among common filesystems (FAT: 2s).
const COARSE_MTIME_SLACK: Duration = Duration::from_secs(2);

/// A thumbnail ready to serve.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// JPEG bytes
    pub bytes: Vec<u8>,
    /// Location of the cache artifact
    pub path: PathBuf,
    /// Whether this request rendered the artifact
    pub regenerated: bool,
    /// `Cache-Control` hint for downstream consumers
    pub cache_control: String,
}

/// Renders and caches thumbnails of original images.
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    images_dir: PathBuf,
    cache_dir: PathBuf,
    config: ThumbnailConfig,
}

impl ThumbnailCache {
    /// Create a cache over `images_dir` that stores artifacts in `cache_dir`.
    pub fn new(images_dir: PathBuf, cache_dir: PathBuf, config: ThumbnailConfig) -> Self {
        Self {
            images_dir,
            cache_dir,
            config,
        }
    }

    /// Create a cache using the resolved directories from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.images_dir(),
            config.thumbnail_dir(),
            config.thumbnail.clone(),
        )
    }

    /// Artifact file name for an original: prefix plus name, forced to `.jpg`.
    ///
    /// Names already ending in `.jpg`/`.jpeg` keep their suffix; anything else
    /// gets `.jpg` appended, so `a.png` and `a.jpg` never share an artifact.
    pub fn artifact_name(&self, filename: &str) -> String {
        let is_jpeg = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
            .unwrap_or(false);
        if is_jpeg {
            format!("{}{}", self.config.prefix, filename)
        } else {
            format!("{}{}.jpg", self.config.prefix, filename)
        }
    }

    /// Full artifact path for an original filename.
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.cache_dir.join(self.artifact_name(filename))
    }

    /// Value for a `Cache-Control` response header.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.config.cache_max_age_secs)
    }

    /// Thumbnail for a catalog filename inside the originals directory.
    ///
    /// Names that would escape the directory are reported as not found.
    pub fn get_by_filename(&self, filename: &str) -> Result<Thumbnail, ThumbnailError> {
        let original = self.images_dir.join(filename);
        if !is_plain_filename(filename) {
            return Err(ThumbnailError::NotFound(original));
        }
        self.get_thumbnail(&original)
    }

    /// Thumbnail for an original image, reusing a fresh artifact if present.
    pub fn get_thumbnail(&self, original: &Path) -> Result<Thumbnail, ThumbnailError> {
        let metadata = match std::fs::metadata(original) {
            Ok(m) if m.is_file() => m,
            _ => return Err(ThumbnailError::NotFound(original.to_path_buf())),
        };
        let original_mtime = metadata.modified()?;
        let filename = original
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ThumbnailError::NotFound(original.to_path_buf()))?;
        let artifact = self.artifact_path(filename);

        if is_fresh(&artifact, original_mtime) {
            match std::fs::read(&artifact) {
                Ok(bytes) => {
                    tracing::trace!("Thumbnail cache hit: {:?}", artifact);
                    return Ok(self.thumbnail(bytes, artifact, false));
                }
                // removed between the freshness check and the read
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let start = std::time::Instant::now();
        let bytes = self.render(original)?;
        self.store(&artifact, &bytes, original_mtime)?;
        tracing::debug!(
            "Rendered thumbnail for {:?} ({} bytes) in {:?}",
            filename,
            bytes.len(),
            start.elapsed()
        );
        Ok(self.thumbnail(bytes, artifact, true))
    }

    /// Run `get_by_filename` on the blocking thread pool.
    pub async fn get_async(&self, filename: &str) -> Result<Thumbnail, ThumbnailError> {
        let cache = self.clone();
        let filename = filename.to_string();
        let original = self.images_dir.join(&filename);
        tokio::task::spawn_blocking(move || cache.get_by_filename(&filename))
            .await
            .map_err(|e| ThumbnailError::Generation {
                path: original,
                message: format!("Task join error: {}", e),
            })?
    }

    /// Remove the artifact for an original. Returns whether one existed.
    pub fn invalidate(&self, filename: &str) -> Result<bool, ThumbnailError> {
        if !is_plain_filename(filename) {
            return Ok(false);
        }
        match std::fs::remove_file(self.artifact_path(filename)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn thumbnail(&self, bytes: Vec<u8>, path: PathBuf, regenerated: bool) -> Thumbnail {
        Thumbnail {
            bytes,
            path,
            regenerated,
            cache_control: self.cache_control(),
        }
    }

    /// Decode, flatten, bound and encode an original.
    fn render(&self, original: &Path) -> Result<Vec<u8>, ThumbnailError> {
        let generation_err = |message: String| ThumbnailError::Generation {
            path: original.to_path_buf(),
            message,
        };
        let image = image::ImageReader::open(original)
            .map_err(|e| generation_err(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| generation_err(e.to_string()))?
            .decode()
            .map_err(|e| generation_err(e.to_string()))?;

        let rgb = fit_within(flatten_onto_white(image), self.config.max_size);
        encode_jpeg(&rgb, self.config.quality).map_err(generation_err)
    }

    /// Write an artifact via temp file and rename, stamped with `mtime`.
    ///
    /// Stamping with the original's mtime (read before rendering) means an
    /// edit made while rendering still invalidates the artifact. A cache
    /// directory on a filesystem with coarser timestamps (FAT, HFS+) would
    /// round the stamp below `mtime`, so the stamp is bumped past it there.
    fn store(&self, artifact: &Path, bytes: &[u8], mtime: SystemTime) -> Result<(), ThumbnailError> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .suffix(".jpg")
            .tempfile_in(&self.cache_dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        let file = tmp.as_file();
        file.set_modified(mtime)?;
        if file.metadata()?.modified()? < mtime {
            file.set_modified(mtime + COARSE_MTIME_SLACK)?;
        }
        tmp.persist(artifact).map_err(|e| e.error)?;
        Ok(())
    }
}

fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains('/')
        && !filename.contains('\\')
}

fn is_fresh(artifact: &Path, original_mtime: SystemTime) -> bool {
    std::fs::metadata(artifact)
        .and_then(|m| m.modified())
        .map(|artifact_mtime| artifact_mtime >= original_mtime)
        .unwrap_or(false)
}

/// Composite any alpha channel onto opaque white and drop it.
///
/// Palette images arrive here already expanded by the decoder.
pub fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }
    let rgba = image.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let a = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Dimensions scaled to fit in a `max`×`max` box, never enlarged.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = f64::min(max as f64 / width as f64, max as f64 / height as f64);
    let scaled = |d: u32| ((d as f64 * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

/// Downscale with Lanczos filtering if either side exceeds `max`.
pub fn fit_within(image: RgbImage, max: u32) -> RgbImage {
    let (width, height) = bounded_dimensions(image.width(), image.height(), max);
    if (width, height) == image.dimensions() {
        return image;
    }
    image::imageops::resize(&image, width, height, FilterType::Lanczos3)
}

/// JPEG with optimized Huffman tables (libjpeg `optimize_coding`).
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, String> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    // mozjpeg reports libjpeg errors by unwinding
    std::panic::catch_unwind(|| -> std::io::Result<Vec<u8>> {
        let mut compress = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        compress.set_size(width, height);
        compress.set_quality(f32::from(quality));
        compress.set_optimize_coding(true);
        let mut started = compress.start_compress(Vec::new())?;
        started.write_scanlines(image.as_raw())?;
        started.finish()
    })
    .map_err(|_| "JPEG encoder failed".to_string())?
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(dir: &Path) -> ThumbnailCache {
        ThumbnailCache::new(
            dir.join("fishes"),
            dir.join("thumbnails"),
            ThumbnailConfig::default(),
        )
    }

    #[test]
    fn test_artifact_name_forces_jpg() {
        let cache = cache(Path::new("/tmp/reef"));
        assert_eq!(cache.artifact_name("turtle.jpg"), "thumb_turtle.jpg");
        assert_eq!(cache.artifact_name("turtle.JPEG"), "thumb_turtle.JPEG");
        assert_eq!(cache.artifact_name("turtle.png"), "thumb_turtle.png.jpg");
        assert_eq!(cache.artifact_name("turtle"), "thumb_turtle.jpg");
    }

    #[test]
    fn test_bounded_dimensions() {
        assert_eq!(bounded_dimensions(1000, 500, 400), (400, 200));
        assert_eq!(bounded_dimensions(300, 1200, 400), (100, 400));
        assert_eq!(bounded_dimensions(120, 80, 400), (120, 80));
        assert_eq!(bounded_dimensions(400, 400, 400), (400, 400));
        assert_eq!(bounded_dimensions(5000, 1, 400), (400, 1));
    }

    #[test]
    fn test_bounded_dimensions_zero_max() {
        assert_eq!(bounded_dimensions(800, 600, 0), (1, 1));
    }

    #[test]
    fn test_flatten_transparent_becomes_white() {
        let mut rgba = image::RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([10, 20, 30, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let rgb = flatten_onto_white(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_flatten_half_alpha_blends() {
        let mut rgba = image::RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        let rgb = flatten_onto_white(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([127, 127, 127]));
    }

    #[test]
    fn test_encode_jpeg_signature() {
        let img = RgbImage::from_pixel(64, 32, Rgb([0, 90, 160]));
        let bytes = encode_jpeg(&img, 85).unwrap();
        assert_eq!(&bytes[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    fn mean_abs_error(a: &RgbImage, b: &RgbImage) -> f64 {
        let total: u64 = a
            .as_raw()
            .iter()
            .zip(b.as_raw())
            .map(|(&x, &y)| u64::from(x.abs_diff(y)))
            .sum();
        total as f64 / a.as_raw().len() as f64
    }

    #[test]
    fn test_encode_jpeg_decodes_with_true_colours() {
        for colour in [[255, 255, 255], [20, 90, 150], [200, 40, 10]] {
            let img = RgbImage::from_pixel(40, 40, Rgb(colour));
            let bytes = encode_jpeg(&img, 85).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
            let px = decoded.get_pixel(20, 20).0;
            for (got, want) in px.iter().zip(colour) {
                assert!(got.abs_diff(want) <= 4, "{colour:?} decoded as {px:?}");
            }
        }
    }

    #[test]
    fn test_encode_jpeg_gradient_fidelity() {
        let img = RgbImage::from_fn(120, 80, |x, y| {
            Rgb([(x * 2) as u8, (y * 3) as u8, (255 - x * 2) as u8])
        });
        let bytes = encode_jpeg(&img, 85).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), img.dimensions());
        let error = mean_abs_error(&img, &decoded);
        assert!(error < 4.0, "mean absolute error {error}");
    }

    #[test]
    fn test_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        for name in ["", "..", "../secret.jpg", "a/b.jpg"] {
            let err = cache.get_by_filename(name).unwrap_err();
            assert!(err.is_not_found(), "{name:?} should be not found");
        }
    }

    #[test]
    fn test_missing_original_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = cache(dir.path()).get_by_filename("ghost.jpg").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalidate_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!cache(dir.path()).invalidate("ghost.jpg").unwrap());
    }
}
