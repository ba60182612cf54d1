//! The producer/consumer transformation pipeline.
//!
//! - **channel**: bounded blocking FIFO between stages
//! - **generator**: emits tasks onto the task channel
//! - **worker**: fixed pool turning tasks into outcomes, plus the drain barrier
//! - **collector**: folds outcomes into a report
//! - **processor**: orchestrates a run and its shutdown
//! - **discovery**: finds source assets, prepares the output directory
//! - **transform**: kind → pixel operation dispatch
//! - **events**: structured events and sinks

pub mod channel;
pub mod collector;
pub mod discovery;
pub mod events;
pub mod generator;
pub mod processor;
pub mod transform;
pub mod worker;

// Re-exports for convenient access
pub use channel::BoundedChannel;
pub use collector::ResultCollector;
pub use discovery::{prepare_output_dir, AssetDiscovery};
pub use events::{EventSink, FanoutSink, MemorySink, NoopSink, PipelineEvent, TracingSink};
pub use generator::{destination_for, TaskGenerator};
pub use processor::{Pipeline, RunRequest};
pub use transform::{ImageTransformer, PixelOp, Transform};
pub use worker::{process_task, DrainBarrier, WorkerPool, WorkerStats};
