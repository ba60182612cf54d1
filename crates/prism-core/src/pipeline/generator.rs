//! Task generation: turns an asset listing into a fixed number of tasks.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::channel::BoundedChannel;
use super::events::{EventSink, PipelineEvent};
use crate::error::PipelineResult;
use crate::types::{Task, TransformKind};

/// Emits `num_tasks` tasks onto the task channel.
///
/// Sources are picked uniformly at random with replacement, so the same
/// asset usually appears in several tasks. The generator never closes the
/// channel; that is the orchestrator's job.
pub struct TaskGenerator {
    assets: Vec<PathBuf>,
    kind: TransformKind,
    output_dir: PathBuf,
    num_tasks: usize,
    rng: StdRng,
}

impl TaskGenerator {
    /// Create a generator over `assets` with an entropy-seeded selector.
    pub fn new(
        assets: Vec<PathBuf>,
        kind: TransformKind,
        output_dir: impl Into<PathBuf>,
        num_tasks: usize,
    ) -> Self {
        Self {
            assets,
            kind,
            output_dir: output_dir.into(),
            num_tasks,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed so source selection is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of tasks `run` will emit: zero without assets, `num_tasks` otherwise.
    pub fn expected_tasks(&self) -> usize {
        if self.assets.is_empty() {
            0
        } else {
            self.num_tasks
        }
    }

    /// Emit every task, blocking whenever the channel is full.
    ///
    /// Returns the number of tasks enqueued. Fails only if the channel was
    /// closed underneath the generator, which means the lifecycle is broken.
    pub fn run(
        mut self,
        channel: &BoundedChannel<Task>,
        events: &dyn EventSink,
    ) -> PipelineResult<usize> {
        events.emit(&PipelineEvent::GeneratorStarted {
            num_tasks: self.num_tasks,
            assets: self.assets.len(),
        });

        let mut emitted = 0;
        for i in 0..self.expected_tasks() {
            let Some(source) = self.assets.choose(&mut self.rng).cloned() else {
                break;
            };
            let created_at = SystemTime::now();
            let task = Task {
                id: i as u64,
                destination: destination_for(&self.output_dir, &source, self.kind, i, created_at),
                source,
                kind: self.kind,
                created_at,
            };
            let (task_id, source) = (task.id, task.source.clone());

            if let Err(e) = channel.put(task) {
                events.emit(&PipelineEvent::GeneratorFinished { emitted });
                return Err(e);
            }
            emitted += 1;

            events.emit(&PipelineEvent::TaskEnqueued {
                task_id,
                source,
                kind: self.kind,
                occupancy: channel.len(),
            });
        }

        events.emit(&PipelineEvent::GeneratorFinished { emitted });
        Ok(emitted)
    }
}

/// Build `<output_dir>/<stem>_<kind>_<index>_<unix seconds><.ext>`.
///
/// The index alone keeps names unique within a run.
pub fn destination_for(
    output_dir: &Path,
    source: &Path,
    kind: TransformKind,
    index: usize,
    created_at: SystemTime,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = created_at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    output_dir.join(format!("{stem}_{kind}_{index}_{timestamp}{ext}"))
}
