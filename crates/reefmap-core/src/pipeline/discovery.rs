//! Finding candidate photographs in the originals directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::error::PipelineError;

/// Lists supported image files directly inside a directory.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    config: ScanConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Supported files in `dir`, not descending into subdirectories.
    ///
    /// Entries come back in directory-enumeration order unless
    /// `sort_by_name` is set. Unreadable entries are skipped.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        if !dir.is_dir() {
            return Err(PipelineError::FileNotFound(dir.to_path_buf()));
        }
        std::fs::read_dir(dir).map_err(|e| PipelineError::Directory {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_supported(entry.path()) {
                files.push(entry.into_path());
            }
        }

        if self.config.sort_by_name {
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        Ok(files)
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
