//! Structured pipeline events and the sinks that consume them.
//!
//! The coordination code never logs directly. It reports what happened as a
//! [`PipelineEvent`] to an [`EventSink`]; whoever builds the pipeline decides
//! whether those events become log lines, a progress bar, or nothing.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::types::TransformKind;

/// Something observable that happened inside a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The generator is about to emit tasks
    GeneratorStarted { num_tasks: usize, assets: usize },
    /// A task was accepted by the task channel
    TaskEnqueued {
        task_id: u64,
        source: PathBuf,
        kind: TransformKind,
        occupancy: usize,
    },
    /// The generator stopped emitting
    GeneratorFinished { emitted: usize },
    /// A worker thread entered its loop
    WorkerStarted { worker_id: usize },
    /// A worker dequeued a task
    TaskStarted {
        worker_id: usize,
        task_id: u64,
        occupancy: usize,
    },
    /// A worker enqueued the outcome of a task
    OutcomeProduced {
        worker_id: usize,
        task_id: u64,
        success: bool,
        duration: Duration,
    },
    /// A worker left its loop
    WorkerStopped { worker_id: usize, processed: usize },
    /// Every emitted task has an outcome; no worker is mid-task
    PoolIdle { completed: usize },
    /// The collector finalized its report
    CollectorFinished { received: usize, expected: usize },
}

/// Receives pipeline events. Called from any pipeline thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::GeneratorStarted { num_tasks, assets } => {
                tracing::info!(num_tasks, assets, "Generator started");
            }
            PipelineEvent::TaskEnqueued {
                task_id,
                source,
                kind,
                occupancy,
            } => {
                tracing::debug!(
                    task_id,
                    source = %source.display(),
                    kind = %kind,
                    occupancy,
                    "Task enqueued"
                );
            }
            PipelineEvent::GeneratorFinished { emitted } => {
                tracing::info!(emitted, "Generator finished");
            }
            PipelineEvent::WorkerStarted { worker_id } => {
                tracing::debug!(worker_id, "Worker started");
            }
            PipelineEvent::TaskStarted {
                worker_id,
                task_id,
                occupancy,
            } => {
                tracing::trace!(worker_id, task_id, occupancy, "Task started");
            }
            PipelineEvent::OutcomeProduced {
                worker_id,
                task_id,
                success,
                duration,
            } => {
                if *success {
                    tracing::debug!(worker_id, task_id, ?duration, "Task succeeded");
                } else {
                    tracing::warn!(worker_id, task_id, ?duration, "Task failed");
                }
            }
            PipelineEvent::WorkerStopped {
                worker_id,
                processed,
            } => {
                tracing::debug!(worker_id, processed, "Worker stopped");
            }
            PipelineEvent::PoolIdle { completed } => {
                tracing::debug!(completed, "Worker pool idle");
            }
            PipelineEvent::CollectorFinished { received, expected } => {
                if received < expected {
                    tracing::warn!(received, expected, "Collector finished short");
                } else {
                    tracing::info!(received, "Collector finished");
                }
            }
        }
    }
}

/// Broadcasts every event to several sinks, in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink to the broadcast list.
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &PipelineEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

/// Keeps every event in memory. Handy for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Number of events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}
