//! Prism Core - bounded producer/consumer image transformation pipeline.
//!
//! A generator emits a fixed number of transformation tasks onto a bounded
//! channel, a fixed pool of worker threads applies the transform to each one,
//! and a collector gathers exactly one outcome per task into a report.
//!
//! # Architecture
//!
//! ```text
//! Assets → Generator → [task channel] → Workers × N → [result channel] → Collector → Report
//! ```
//!
//! Both channels are bounded, so a slow stage pushes back on the stage before
//! it instead of growing a queue. Shutdown is driven by a drain barrier, not
//! by timers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::{Config, Pipeline, TransformKind};
//!
//! #[tokio::main]
//! async fn main() -> prism_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::new(config);
//!
//!     let mut request = pipeline.request();
//!     request.kind = TransformKind::Blur;
//!
//!     let summary = pipeline.run(request).await?;
//!     println!("{}/{} succeeded", summary.report.successful, summary.report.total);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod assets;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, PrismError, Result};
pub use output::{OutputFormat, ReportWriter};
pub use pipeline::{
    BoundedChannel, EventSink, ImageTransformer, Pipeline, PipelineEvent, RunRequest, Transform,
};
pub use types::{InputStatus, Outcome, Report, RunSummary, Task, TransformKind};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
