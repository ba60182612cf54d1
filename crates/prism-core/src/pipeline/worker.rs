//! Worker pool: a fixed number of threads turning tasks into outcomes.
//!
//! Each worker pulls one task at a time, runs the transform, and pushes one
//! outcome. A failing or panicking transform becomes a failed outcome; it
//! never takes the worker down. Shutdown is cooperative: the orchestrator
//! waits on the [`DrainBarrier`], raises the stop flag, closes the task
//! channel and joins every thread.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::channel::BoundedChannel;
use super::events::{EventSink, PipelineEvent};
use super::transform::Transform;
use crate::error::{ConfigError, PipelineError, PrismError, Result};
use crate::types::{Outcome, Task};

/// Tracks enqueued outcomes and live workers so shutdown can wait for a drain.
#[derive(Debug, Default)]
pub struct DrainBarrier {
    state: Mutex<BarrierState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct BarrierState {
    completed: usize,
    active_workers: usize,
}

impl DrainBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes enqueued on the result channel so far.
    pub fn completed(&self) -> usize {
        self.state.lock().completed
    }

    /// Workers that have not left their loop yet.
    pub fn active_workers(&self) -> usize {
        self.state.lock().active_workers
    }

    /// Block until `expected` outcomes were enqueued or no worker is left.
    ///
    /// Returns the number of outcomes enqueued at that point. Since each
    /// outcome is counted only after its task finished, reaching `expected`
    /// means no worker is still busy with one of those tasks.
    pub fn wait_for(&self, expected: usize) -> usize {
        let mut state = self.state.lock();
        while state.completed < expected && state.active_workers > 0 {
            self.changed.wait(&mut state);
        }
        state.completed
    }

    fn worker_registered(&self) {
        self.state.lock().active_workers += 1;
    }

    fn worker_exited(&self) {
        let mut state = self.state.lock();
        state.active_workers = state.active_workers.saturating_sub(1);
        drop(state);
        self.changed.notify_all();
    }

    fn outcome_enqueued(&self) {
        self.state.lock().completed += 1;
        self.changed.notify_all();
    }
}

/// Deregisters a worker from the barrier when its thread ends, even by panic.
struct ExitGuard(Arc<DrainBarrier>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.worker_exited();
    }
}

/// What a worker did before it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub worker_id: usize,
    /// Outcomes this worker enqueued
    pub processed: usize,
    /// Set if the worker stopped for any reason other than shutdown
    pub error: Option<String>,
}

/// Everything one worker thread needs.
struct Worker {
    id: usize,
    tasks: Arc<BoundedChannel<Task>>,
    results: Arc<BoundedChannel<Outcome>>,
    transform: Arc<dyn Transform>,
    events: Arc<dyn EventSink>,
    stop: Arc<AtomicBool>,
    barrier: Arc<DrainBarrier>,
}

impl Worker {
    fn run(self) -> WorkerStats {
        let _guard = ExitGuard(Arc::clone(&self.barrier));
        self.events.emit(&PipelineEvent::WorkerStarted { worker_id: self.id });

        let mut processed = 0;
        let mut error = None;
        loop {
            // Checked between tasks only; a task in progress always completes
            if self.stop.load(Ordering::Acquire) {
                break;
            }
            let Some(task) = self.tasks.get() else {
                break;
            };
            self.events.emit(&PipelineEvent::TaskStarted {
                worker_id: self.id,
                task_id: task.id,
                occupancy: self.tasks.len(),
            });

            let outcome = process_task(self.id, self.transform.as_ref(), task);
            let (task_id, success, duration) =
                (outcome.task_id, outcome.success, outcome.duration);

            if let Err(e) = self.results.put(outcome) {
                error = Some(format!("outcome for task {task_id} lost: {e}"));
                break;
            }
            self.barrier.outcome_enqueued();
            processed += 1;

            self.events.emit(&PipelineEvent::OutcomeProduced {
                worker_id: self.id,
                task_id,
                success,
                duration,
            });
        }

        self.events.emit(&PipelineEvent::WorkerStopped {
            worker_id: self.id,
            processed,
        });
        WorkerStats {
            worker_id: self.id,
            processed,
            error,
        }
    }
}

/// Run the transform for one task and wrap the result as an [`Outcome`].
///
/// Errors and panics from the transform both yield a failed outcome.
pub fn process_task(worker_id: usize, transform: &dyn Transform, task: Task) -> Outcome {
    let start = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        transform.apply(task.kind, &task.source, &task.destination)
    }));
    let duration = start.elapsed();

    let (success, message) = match result {
        Ok(Ok(())) => (true, format!("saved {}", task.destination.display())),
        Ok(Err(e)) => (false, e.to_string()),
        Err(payload) => {
            let err = PipelineError::WorkerPanicked {
                task_id: task.id,
                message: panic_message(payload.as_ref()),
            };
            (false, err.to_string())
        }
    };

    Outcome {
        task_id: task.id,
        success,
        message,
        duration,
        worker_id,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A fixed-size pool of worker threads sharing one task and one result channel.
pub struct WorkerPool {
    handles: Vec<(usize, JoinHandle<WorkerStats>)>,
    tasks: Arc<BoundedChannel<Task>>,
    stop: Arc<AtomicBool>,
    barrier: Arc<DrainBarrier>,
    events: Arc<dyn EventSink>,
}

impl WorkerPool {
    /// Start `size` workers. The size is fixed for the pool's lifetime.
    pub fn spawn(
        size: usize,
        tasks: Arc<BoundedChannel<Task>>,
        results: Arc<BoundedChannel<Outcome>>,
        transform: Arc<dyn Transform>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        if size == 0 {
            let reason = "worker pool size must be > 0".to_string();
            return Err(ConfigError::ValidationError(reason).into());
        }

        let mut pool = Self {
            handles: Vec::with_capacity(size),
            tasks,
            stop: Arc::new(AtomicBool::new(false)),
            barrier: Arc::new(DrainBarrier::new()),
            events,
        };

        for id in 0..size {
            let worker = Worker {
                id,
                tasks: Arc::clone(&pool.tasks),
                results: Arc::clone(&results),
                transform: Arc::clone(&transform),
                events: Arc::clone(&pool.events),
                stop: Arc::clone(&pool.stop),
                barrier: Arc::clone(&pool.barrier),
            };

            // Register before the thread exists so a drain wait cannot pass early
            pool.barrier.worker_registered();
            let spawned = thread::Builder::new()
                .name(format!("prism-worker-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => pool.handles.push((id, handle)),
                Err(e) => {
                    pool.barrier.worker_exited();
                    pool.shutdown();
                    return Err(PrismError::Io(e));
                }
            }
        }

        Ok(pool)
    }

    /// Number of workers in the pool.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Shared drain barrier.
    pub fn barrier(&self) -> &DrainBarrier {
        &self.barrier
    }

    /// Drain barrier: block until `expected` outcomes were enqueued.
    ///
    /// Also returns if every worker already exited, so a broken pool cannot
    /// hang shutdown. Returns the number of outcomes enqueued.
    pub fn wait_until_drained(&self, expected: usize) -> usize {
        let completed = self.barrier.wait_for(expected);
        self.events.emit(&PipelineEvent::PoolIdle { completed });
        completed
    }

    /// Signal every worker to stop, then join them all.
    ///
    /// Workers finish the task in hand, drain nothing further once the stop
    /// flag is seen, and exit. Returns per-worker stats ordered by worker id.
    pub fn shutdown(mut self) -> Vec<WorkerStats> {
        self.signal_stop();

        std::mem::take(&mut self.handles)
            .into_iter()
            .map(|(worker_id, handle)| {
                handle.join().unwrap_or_else(|payload| WorkerStats {
                    worker_id,
                    processed: 0,
                    error: Some(format!(
                        "worker panicked: {}",
                        panic_message(payload.as_ref())
                    )),
                })
            })
            .collect()
    }

    fn signal_stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.tasks.close();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // A pool dropped without shutdown must not leave threads parked forever
        if !self.handles.is_empty() {
            self.signal_stop();
        }
    }
}
