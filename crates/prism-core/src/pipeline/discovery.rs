//! Filesystem collaborators: source asset discovery and output directory setup.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::{PipelineError, PipelineResult};

/// Finds source images in a directory.
pub struct AssetDiscovery {
    supported_formats: Vec<String>,
}

impl AssetDiscovery {
    /// Create a discovery instance recognizing the configured formats.
    pub fn new(config: &ProcessingConfig) -> Self {
        Self {
            supported_formats: config
                .supported_formats
                .iter()
                .map(|fmt| fmt.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// List the supported images at `path`, sorted by path.
    ///
    /// A directory is scanned one level deep (no recursion). A file is
    /// returned on its own if its extension is supported. An existing
    /// location without images yields an empty list, which is not an error.
    pub fn discover(&self, path: &Path) -> PipelineResult<Vec<PathBuf>> {
        if !path.exists() {
            return Err(PipelineError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        if path.is_file() {
            return Ok(if self.is_supported(path) {
                vec![path.to_path_buf()]
            } else {
                vec![]
            });
        }

        let mut assets: Vec<PathBuf> = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && self.is_supported(e.path()))
            .map(|e| e.into_path())
            .collect();

        // Sort by path for deterministic ordering
        assets.sort();
        Ok(assets)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.supported_formats.contains(&ext_lower)
            })
            .unwrap_or(false)
    }
}

/// Make sure the output directory exists. Safe to call repeatedly.
pub fn prepare_output_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
