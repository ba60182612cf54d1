//! CLI enum types for the process command: transform kind and report format.

use clap::ValueEnum;
use prism_core::{OutputFormat as CoreOutputFormat, TransformKind};

/// Transform applied to every task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransformArg {
    /// Colour negative
    Invert,
    /// Gaussian blur
    Blur,
    /// Horizontal mirror
    Mirror,
}

impl From<TransformArg> for TransformKind {
    fn from(arg: TransformArg) -> Self {
        match arg {
            TransformArg::Invert => TransformKind::Invert,
            TransformArg::Blur => TransformKind::Blur,
            TransformArg::Mirror => TransformKind::Mirror,
        }
    }
}

/// Supported report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary table
    Text,
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => CoreOutputFormat::Text,
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
