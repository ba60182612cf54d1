//! Core data types for the Prism pipeline.
//!
//! A [`Task`] flows from the generator to exactly one worker, which turns it
//! into exactly one [`Outcome`]. The collector folds outcomes into a
//! [`Report`], and the orchestrator wraps that in a [`RunSummary`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use crate::error::PipelineError;

/// The closed set of supported pixel operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Colour inversion (negative)
    Invert,
    /// Gaussian blur
    Blur,
    /// Horizontal mirror
    Mirror,
}

impl TransformKind {
    /// Every kind, in declaration order.
    pub const ALL: [TransformKind; 3] = [Self::Invert, Self::Blur, Self::Mirror];

    /// Lowercase name, also used in destination file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invert => "invert",
            Self::Blur => "blur",
            Self::Mirror => "mirror",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invert" => Ok(Self::Invert),
            "blur" => Ok(Self::Blur),
            "mirror" => Ok(Self::Mirror),
            other => Err(PipelineError::UnsupportedTransform {
                kind: other.to_string(),
            }),
        }
    }
}

/// One unit of requested transformation work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique within a run, assigned in emission order starting at 0
    pub id: u64,
    /// Image to read
    pub source: PathBuf,
    /// Where the transformed image is written
    pub destination: PathBuf,
    /// Operation to apply
    pub kind: TransformKind,
    /// When the generator built the task
    pub created_at: SystemTime,
}

/// The result record produced for exactly one [`Task`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Id of the originating task
    pub task_id: u64,

    /// Whether the transform completed without error
    pub success: bool,

    /// Destination on success, diagnostic on failure
    pub message: String,

    /// Wall-clock time spent in the transform
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,

    /// Worker that processed the task
    pub worker_id: usize,
}

/// Aggregate of all outcomes received by the collector.
///
/// Built incrementally by the collector and finalized once the expected
/// number of outcomes arrived; read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Outcomes in receive order (not task-id order)
    pub outcomes: Vec<Outcome>,

    /// Number of outcomes the collector waited for
    pub expected: usize,

    /// Number of outcomes received
    pub total: usize,

    /// Outcomes with `success == true`
    pub successful: usize,

    /// `total - successful`
    pub failed: usize,

    /// Sum of all outcome durations
    #[serde(rename = "total_duration_ms", with = "duration_ms")]
    pub total_duration: Duration,

    /// `total_duration / total`, zero for an empty report
    #[serde(rename = "mean_duration_ms", with = "duration_ms")]
    pub mean_duration: Duration,

    /// False if the result channel closed before `expected` outcomes arrived
    pub complete: bool,
}

impl Report {
    pub(crate) fn new(expected: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(expected),
            expected,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        if outcome.success {
            self.successful += 1;
        }
        self.total += 1;
        self.total_duration += outcome.duration;
        self.outcomes.push(outcome);
    }

    pub(crate) fn finalize(mut self) -> Self {
        self.failed = self.total - self.successful;
        self.mean_duration = mean_duration(self.total_duration, self.total);
        self.complete = self.total >= self.expected;
        self
    }

    /// Failed outcomes, in receive order.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Task ids of all received outcomes, sorted ascending.
    pub fn task_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.outcomes.iter().map(|o| o.task_id).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of outcomes produced by each worker.
    pub fn per_worker(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.worker_id).or_insert(0) += 1;
        }
        counts
    }
}

/// What the asset enumerator found for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InputStatus {
    /// At least one source asset was found
    Found { assets: usize },
    /// The location exists but holds no recognized images
    Empty,
    /// The location does not exist
    NotFound { path: PathBuf },
}

impl InputStatus {
    /// True when the run had nothing to work on.
    pub fn is_no_input(&self) -> bool {
        !matches!(self, Self::Found { .. })
    }
}

/// Everything a run produced: the collector's report plus run-level facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Transform applied to every task
    pub kind: TransformKind,

    /// Asset enumeration result
    pub input: InputStatus,

    /// Tasks the generator actually enqueued
    pub tasks_emitted: usize,

    /// Worker pool size
    pub workers: usize,

    /// Wall-clock time for the whole run
    #[serde(rename = "elapsed_ms", with = "duration_ms")]
    pub elapsed: Duration,

    /// Collector output
    pub report: Report,
}

impl RunSummary {
    /// Completed tasks per second of wall-clock time.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.report.total as f64 / secs
        } else {
            0.0
        }
    }
}

/// Serialize a `Duration` as fractional milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(ms.max(0.0) / 1000.0))
    }
}

/// `total / count`, or zero for an empty run.
fn mean_duration(total: Duration, count: usize) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(count) => total / count,
        Err(_) => total.div_f64(count as f64),
    }
}
