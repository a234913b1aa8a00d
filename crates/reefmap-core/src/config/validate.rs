//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "scan.supported_formats must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.thumbnail.max_size == 0 {
            return Err(ConfigError::ValidationError(
                "thumbnail.max_size must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(ConfigError::ValidationError(
                "thumbnail.quality must be between 1 and 100".into(),
            ));
        }
        let prefix = &self.thumbnail.prefix;
        if prefix.is_empty() || prefix.contains('/') || prefix.contains('\\') {
            return Err(ConfigError::ValidationError(
                "thumbnail.prefix must be non-empty and contain no path separators".into(),
            ));
        }
        Ok(())
    }
}
