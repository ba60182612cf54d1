//! Error types for the Prism transformation pipeline.
//!
//! Errors are split by concern: configuration problems surface before a run
//! starts, pipeline errors describe what went wrong for a run or a single task.
//! Per-task errors never escape a worker; they become failed outcomes.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::TransformKind;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

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

/// Pipeline errors, from run setup down to a single task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The asset location could not be enumerated
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// No transform is bound to the requested kind
    #[error("Unsupported transform: {kind}")]
    UnsupportedTransform { kind: String },

    /// The transform failed while reading, decoding or writing an image
    #[error("Transform failed for {path}: {message}")]
    TransformFailure { path: PathBuf, message: String },

    /// The transform panicked; the worker recovered and kept running
    #[error("Transform panicked on task {task_id}: {message}")]
    WorkerPanicked { task_id: u64, message: String },

    /// A put was attempted on a closed channel
    #[error("Channel closed")]
    ChannelClosed,

    /// A channel was configured without room for a single item
    #[error("Invalid channel capacity {capacity}: must be at least 1")]
    InvalidCapacity { capacity: usize },
}

impl PipelineError {
    /// Shorthand for an unsupported transform error.
    pub fn unsupported(kind: TransformKind) -> Self {
        Self::UnsupportedTransform {
            kind: kind.to_string(),
        }
    }

    /// Shorthand for a transform failure on `path`.
    pub fn transform_failure(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::TransformFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
