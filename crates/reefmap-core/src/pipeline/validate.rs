//! Cheap checks run before an image is opened for decoding.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Container family recognised from the leading bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
    /// ISO base media (HEIC, HEIF, AVIF)
    IsoBmff,
}

impl Container {
    /// Identify the container from up to 12 header bytes.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        match header {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::WebP),
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(Self::Tiff),
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some(Self::IsoBmff),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Validates files before decoding.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check existence, size limit, and header signature.
    pub fn validate(&self, path: &Path) -> Result<Container, PipelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot read metadata: {}", e),
            },
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let mut header = Vec::with_capacity(12);
        std::fs::File::open(path)
            .and_then(|f| f.take(12).read_to_end(&mut header))
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot open file: {}", e),
            })?;

        Container::sniff(&header).ok_or_else(|| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(LimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_common_containers() {
        assert_eq!(Container::sniff(&[0xFF, 0xD8, 0xFF, 0xE1]), Some(Container::Jpeg));
        assert_eq!(
            Container::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            Some(Container::Png)
        );
        assert_eq!(
            Container::sniff(&[b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P']),
            Some(Container::WebP)
        );
        assert_eq!(Container::sniff(b"II\x2A\x00"), Some(Container::Tiff));
        assert_eq!(Container::sniff(b"MM\x00\x2A"), Some(Container::Tiff));
    }

    #[test]
    fn test_sniff_heic() {
        let header = [0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c'];
        assert_eq!(Container::sniff(&header), Some(Container::IsoBmff));
    }

    #[test]
    fn test_sniff_rejects_garbage_and_short_input() {
        assert_eq!(Container::sniff(&[0u8; 12]), None);
        assert_eq!(Container::sniff(b"II\x00\x00"), None);
        assert_eq!(Container::sniff(&[0xFF]), None);
        assert_eq!(Container::sniff(&[]), None);
    }

    #[test]
    fn test_validate_missing_file() {
        let err = Validator::default()
            .validate(Path::new("/nonexistent/reef.jpg"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_validate_text_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, "not an image at all").unwrap();
        let err = Validator::default().validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }
}
