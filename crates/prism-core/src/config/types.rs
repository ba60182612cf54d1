//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::TransformKind;

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for source images
    pub input_dir: PathBuf,

    /// Directory transformed images are written to (created if missing)
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_images"),
            output_dir: PathBuf::from("output_images"),
        }
    }
}

/// Worker pool and task generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads
    pub workers: usize,

    /// Number of tasks the generator emits
    pub num_tasks: usize,

    /// Recognized source extensions (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Seed for source selection; random when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            num_tasks: 10,
            supported_formats: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "bmp".to_string(),
                "gif".to_string(),
            ],
            seed: None,
        }
    }
}

/// Channel capacities between pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Max tasks buffered between the generator and the workers
    pub task_buffer_size: usize,

    /// Max outcomes buffered between the workers and the collector
    pub result_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            task_buffer_size: 5,
            result_buffer_size: 5,
        }
    }
}

/// Transform settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Transform used when the CLI does not name one
    pub default_kind: TransformKind,

    /// Gaussian sigma for the blur transform
    pub blur_radius: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            default_kind: TransformKind::Invert,
            blur_radius: 2.0,
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format: "text", "json" or "jsonl"
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
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
