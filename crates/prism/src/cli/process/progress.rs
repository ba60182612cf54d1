//! Progress bar driven by pipeline events.

use indicatif::{ProgressBar, ProgressStyle};
use prism_core::pipeline::{EventSink, PipelineEvent};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Advances an `indicatif` bar as outcomes are produced.
pub struct ProgressSink {
    bar: ProgressBar,
    failed: AtomicUsize,
}

impl ProgressSink {
    /// A visible bar on stderr.
    pub fn new() -> Self {
        Self::with_bar(create_progress_bar(0))
    }

    /// A bar that tracks state but draws nothing.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            failed: AtomicUsize::new(0),
        }
    }

    /// Tasks that have an outcome so far.
    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Remove the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::GeneratorStarted { num_tasks, assets } => {
                let total = if *assets == 0 { 0 } else { *num_tasks };
                self.bar.set_length(total as u64);
                self.bar.set_message("running");
            }
            PipelineEvent::OutcomeProduced { success, .. } => {
                if !success {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                }
                let failed = self.failed.load(Ordering::Relaxed);
                if failed > 0 {
                    self.bar.set_message(format!("{failed} failed"));
                }
                self.bar.inc(1);
            }
            PipelineEvent::PoolIdle { .. } => {
                self.bar.set_message("shutting down");
            }
            _ => {}
        }
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}
