//! Result collection: folds outcomes into a [`Report`].

use super::channel::BoundedChannel;
use super::events::{EventSink, PipelineEvent};
use crate::types::{Outcome, Report};

/// Receives exactly `expected` outcomes and summarizes them.
pub struct ResultCollector {
    expected: usize,
}

impl ResultCollector {
    pub fn new(expected: usize) -> Self {
        Self { expected }
    }

    /// Drain outcomes until `expected` were received, then finalize.
    ///
    /// If the result channel is closed and empty before that, the report is
    /// finalized early with `complete == false` instead of waiting forever.
    /// With `expected == 0` the channel is not touched at all.
    pub fn collect(self, results: &BoundedChannel<Outcome>, events: &dyn EventSink) -> Report {
        let mut report = Report::new(self.expected);

        while report.total < self.expected {
            match results.get() {
                Some(outcome) => report.record(outcome),
                None => break,
            }
        }

        events.emit(&PipelineEvent::CollectorFinished {
            received: report.total,
            expected: self.expected,
        });
        report.finalize()
    }
}
