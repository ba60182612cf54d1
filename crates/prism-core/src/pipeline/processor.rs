//! Pipeline orchestration: wires the stages together and owns shutdown.
//!
//! A run goes through these steps, in order:
//!
//! 1. enumerate assets and prepare the output directory
//! 2. start the worker pool and the generator on a lifecycle thread
//! 3. collect outcomes on the calling thread
//! 4. join the generator
//! 5. wait on the drain barrier until every emitted task has an outcome
//! 6. raise the stop flag, close the task channel, join every worker
//! 7. close the result channel, which ends collection
//!
//! Steps 4 to 7 happen on the lifecycle thread while the caller collects.
//! No step waits on a timer.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::config::Config;
use crate::error::{PipelineError, PrismError, Result};
use crate::types::{InputStatus, Outcome, RunSummary, Task, TransformKind};

use super::channel::BoundedChannel;
use super::collector::ResultCollector;
use super::discovery::{prepare_output_dir, AssetDiscovery};
use super::events::{EventSink, TracingSink};
use super::generator::TaskGenerator;
use super::transform::{ImageTransformer, Transform};
use super::worker::WorkerPool;

/// Parameters of a single run. Defaults come from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub kind: TransformKind,
    pub num_tasks: usize,
    pub workers: usize,
    /// Fixed seed for source selection; entropy when `None`
    pub seed: Option<u64>,
}

impl RunRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_dir: config.input_dir(),
            output_dir: config.output_dir(),
            kind: config.transform.default_kind,
            num_tasks: config.processing.num_tasks,
            workers: config.processing.workers,
            seed: config.processing.seed,
        }
    }
}

/// The producer/consumer pipeline.
///
/// Cheap to clone: the transform and event sink are shared.
#[derive(Clone)]
pub struct Pipeline {
    config: Config,
    transform: Arc<dyn Transform>,
    events: Arc<dyn EventSink>,
}

impl Pipeline {
    /// Create a pipeline using the image transformer and `tracing` events.
    pub fn new(config: Config) -> Self {
        let transform = Arc::new(ImageTransformer::new(config.transform.clone()));
        Self {
            config,
            transform,
            events: Arc::new(TracingSink),
        }
    }

    /// Replace the transform workers apply.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    /// Replace the event sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run request built from this pipeline's configuration.
    pub fn request(&self) -> RunRequest {
        RunRequest::from_config(&self.config)
    }

    /// Run the pipeline on a blocking thread so async callers stay responsive.
    pub async fn run(&self, request: RunRequest) -> Result<RunSummary> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.run_blocking(&request))
            .await
            .map_err(|e| PrismError::Io(std::io::Error::other(e)))?
    }

    /// Run the pipeline to completion on the calling thread.
    ///
    /// A missing input location is not an error here: the run completes with
    /// zero tasks and [`InputStatus::NotFound`], and the caller decides how to
    /// surface it. Errors are reserved for setup failures and broken
    /// lifecycles.
    pub fn run_blocking(&self, request: &RunRequest) -> Result<RunSummary> {
        let start = Instant::now();

        let discovery = AssetDiscovery::new(&self.config.processing);
        let (assets, input) = match discovery.discover(&request.input_dir) {
            Ok(assets) if assets.is_empty() => (assets, InputStatus::Empty),
            Ok(assets) => {
                let count = assets.len();
                (assets, InputStatus::Found { assets: count })
            }
            Err(PipelineError::SourceNotFound { path }) => (vec![], InputStatus::NotFound { path }),
            Err(e) => return Err(e.into()),
        };

        prepare_output_dir(&request.output_dir)?;

        let mut generator =
            TaskGenerator::new(assets, request.kind, &request.output_dir, request.num_tasks);
        if let Some(seed) = request.seed {
            generator = generator.with_seed(seed);
        }
        let expected = generator.expected_tasks();

        let buffers = &self.config.pipeline;
        let tasks: Arc<BoundedChannel<Task>> =
            Arc::new(BoundedChannel::new(buffers.task_buffer_size)?);
        let results: Arc<BoundedChannel<Outcome>> =
            Arc::new(BoundedChannel::new(buffers.result_buffer_size)?);

        let lifecycle = {
            let results = Arc::clone(&results);
            let transform = Arc::clone(&self.transform);
            let events = Arc::clone(&self.events);
            let size = request.workers;
            thread::Builder::new()
                .name("prism-lifecycle".into())
                .spawn(move || {
                    drive(generator, size, tasks, results, transform, events)
                })?
        };

        let report = ResultCollector::new(expected).collect(&results, self.events.as_ref());

        let Lifecycle { emitted, workers } = lifecycle.join().map_err(|_| {
            PrismError::Io(std::io::Error::other("pipeline lifecycle thread panicked"))
        })??;

        Ok(RunSummary {
            kind: request.kind,
            input,
            tasks_emitted: emitted,
            workers,
            elapsed: start.elapsed(),
            report,
        })
    }
}

/// What the lifecycle thread reports back once the pool is down.
struct Lifecycle {
    emitted: usize,
    workers: usize,
}

/// Closes the result channel when the lifecycle thread exits, however it exits.
struct CloseResults(Arc<BoundedChannel<Outcome>>);

impl Drop for CloseResults {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Start the pool and the generator, then take the pool down once every
/// emitted task has an outcome. The result channel is closed on return.
fn drive(
    generator: TaskGenerator,
    workers: usize,
    tasks: Arc<BoundedChannel<Task>>,
    results: Arc<BoundedChannel<Outcome>>,
    transform: Arc<dyn Transform>,
    events: Arc<dyn EventSink>,
) -> Result<Lifecycle> {
    let _close = CloseResults(Arc::clone(&results));

    let pool = WorkerPool::spawn(
        workers,
        Arc::clone(&tasks),
        results,
        transform,
        Arc::clone(&events),
    )?;

    let generated = thread::Builder::new()
        .name("prism-generator".into())
        .spawn(move || generator.run(&tasks, events.as_ref()))
        .map_err(PrismError::Io)
        .and_then(join_generator);

    let emitted = match generated {
        Ok(emitted) => emitted,
        Err(e) => {
            // Nothing to drain towards; stop everything and report the failure
            pool.shutdown();
            return Err(e);
        }
    };

    pool.wait_until_drained(emitted);
    let workers = pool.size();
    for stats in pool.shutdown() {
        if let Some(error) = stats.error {
            tracing::warn!(
                worker_id = stats.worker_id,
                %error,
                "Worker stopped abnormally"
            );
        }
    }

    Ok(Lifecycle { emitted, workers })
}

fn join_generator(handle: JoinHandle<std::result::Result<usize, PipelineError>>) -> Result<usize> {
    match handle.join() {
        Ok(emitted) => Ok(emitted?),
        Err(_) => Err(PrismError::Io(std::io::Error::other(
            "task generator thread panicked",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineResult;
    use crate::pipeline::events::{MemorySink, PipelineEvent};
    use std::path::Path;

    fn ok_transform() -> Arc<dyn Transform> {
        Arc::new(|_: TransformKind, _: &Path, _: &Path| -> PipelineResult<()> {
            Ok(())
        })
    }

    fn request(input: &Path, output: &Path, num_tasks: usize, workers: usize) -> RunRequest {
        RunRequest {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            kind: TransformKind::Invert,
            num_tasks,
            workers,
            seed: Some(7),
        }
    }

    #[test]
    fn test_request_from_config() {
        let request = RunRequest::from_config(&Config::default());
        assert_eq!(request.input_dir, PathBuf::from("input_images"));
        assert_eq!(request.output_dir, PathBuf::from("output_images"));
        assert_eq!(request.kind, TransformKind::Invert);
        assert_eq!(request.num_tasks, 10);
        assert_eq!(request.workers, 3);
        assert_eq!(request.seed, None);
    }

    #[test]
    fn test_missing_input_completes_with_zero_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let pipeline = Pipeline::new(Config::default()).with_transform(ok_transform());

        let summary = pipeline
            .run_blocking(&request(&missing, &dir.path().join("out"), 5, 2))
            .unwrap();

        assert_eq!(summary.input, InputStatus::NotFound { path: missing });
        assert_eq!(summary.tasks_emitted, 0);
        assert_eq!(summary.report.total, 0);
        assert!(summary.report.complete);
    }

    #[test]
    fn test_run_emits_lifecycle_events() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("a.png"), b"x").unwrap();

        let sink = Arc::new(MemorySink::new());
        let pipeline = Pipeline::new(Config::default())
            .with_transform(ok_transform())
            .with_events(sink.clone());
        let summary = pipeline
            .run_blocking(&request(&input, &dir.path().join("out"), 6, 2))
            .unwrap();

        assert_eq!(summary.report.total, 6);
        assert_eq!(summary.workers, 2);
        assert_eq!(
            sink.count(|e| matches!(e, PipelineEvent::OutcomeProduced { .. })),
            6
        );
        assert_eq!(
            sink.count(|e| matches!(e, PipelineEvent::WorkerStopped { .. })),
            2
        );
        assert!(sink
            .events()
            .contains(&PipelineEvent::PoolIdle { completed: 6 }));
        assert!(sink.events().contains(&PipelineEvent::CollectorFinished {
            received: 6,
            expected: 6
        }));
    }

    /// Records the name of the thread each `CollectorFinished` is emitted on.
    #[derive(Default)]
    struct CollectorThread(parking_lot::Mutex<Vec<Option<String>>>);

    impl EventSink for CollectorThread {
        fn emit(&self, event: &PipelineEvent) {
            if matches!(event, PipelineEvent::CollectorFinished { .. }) {
                let name = thread::current().name().map(str::to_owned);
                self.0.lock().push(name);
            }
        }
    }

    #[test]
    fn test_collector_runs_on_calling_thread() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();

        let sink = Arc::new(CollectorThread::default());
        let pipeline = Pipeline::new(Config::default())
            .with_transform(ok_transform())
            .with_events(sink.clone());

        let caller = thread::Builder::new()
            .name("run-caller".into())
            .spawn(move || {
                pipeline
                    .run_blocking(&request(dir.path(), &dir.path().join("out"), 5, 2))
                    .unwrap()
            })
            .unwrap();
        let summary = caller.join().unwrap();

        assert_eq!(summary.report.total, 5);
        assert_eq!(*sink.0.lock(), vec![Some("run-caller".to_string())]);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        let pipeline = Pipeline::new(Config::default()).with_transform(ok_transform());

        let err = pipeline
            .run_blocking(&request(dir.path(), &dir.path().join("out"), 3, 0))
            .unwrap_err();
        assert!(matches!(err, PrismError::Config(_)));
    }

    #[tokio::test]
    async fn test_async_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();
        let pipeline = Pipeline::new(Config::default()).with_transform(ok_transform());

        let summary = pipeline
            .run(request(dir.path(), &dir.path().join("out"), 4, 3))
            .await
            .unwrap();
        assert_eq!(summary.report.task_ids(), vec![0, 1, 2, 3]);
        assert_eq!(summary.input, InputStatus::Found { assets: 1 });
    }
}
