//! Human-readable rendering of a run summary.

use console::Style;
use prism_core::{InputStatus, RunSummary};
use std::fmt::Write;
use std::time::Duration;

/// Render the final report as a text table.
///
/// A run without input gets an explicit "no input" notice instead of the
/// table; a run with failures lists each one with its diagnostic.
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, summary);
    out
}

fn write_report(out: &mut String, summary: &RunSummary) -> std::fmt::Result {
    let bold = Style::new().bold();
    let red = Style::new().red();
    let yellow = Style::new().yellow();
    let report = &summary.report;

    writeln!(out)?;
    writeln!(out, "  ====================================")?;
    writeln!(out, "             {}", bold.apply_to("Prism report"))?;
    writeln!(out, "  ====================================")?;

    match &summary.input {
        InputStatus::NotFound { path } => {
            writeln!(
                out,
                "    {} input location not found: {}",
                yellow.apply_to("No input:"),
                path.display()
            )?;
            writeln!(out, "  ====================================")?;
            return Ok(());
        }
        InputStatus::Empty => {
            writeln!(
                out,
                "    {} no supported images in the input location",
                yellow.apply_to("No input:")
            )?;
            writeln!(out, "  ====================================")?;
            return Ok(());
        }
        InputStatus::Found { assets } => {
            writeln!(out, "    Transform:    {:>8}", summary.kind)?;
            writeln!(out, "    Assets:       {:>8}", assets)?;
            writeln!(out, "    Workers:      {:>8}", summary.workers)?;
        }
    }

    writeln!(out, "  ------------------------------------")?;
    writeln!(out, "    Succeeded:    {:>8}", report.successful)?;
    if report.failed > 0 {
        writeln!(out, "    Failed:       {:>8}", red.apply_to(report.failed))?;
    }
    writeln!(out, "    Total:        {:>8}", report.total)?;
    writeln!(out, "  ------------------------------------")?;
    let task_time = millis(report.total_duration);
    let mean = millis(report.mean_duration);
    let elapsed = summary.elapsed.as_secs_f64();
    writeln!(out, "    Task time:    {:>7.1}ms", task_time)?;
    writeln!(out, "    Mean:         {:>7.1}ms", mean)?;
    writeln!(out, "    Elapsed:      {:>7.1}s", elapsed)?;
    let rate = summary.throughput();
    writeln!(out, "    Rate:         {:>7.1} tasks/sec", rate)?;
    writeln!(out, "  ====================================")?;

    if !report.complete {
        writeln!(
            out,
            "    {} received {} of {} expected outcomes",
            yellow.apply_to("Incomplete:"),
            report.total,
            report.expected
        )?;
    }

    let per_worker = report.per_worker();
    if !per_worker.is_empty() {
        writeln!(out, "    Per worker:")?;
        for (worker_id, count) in per_worker {
            writeln!(out, "      worker {worker_id:<3} {count:>6}")?;
        }
    }

    if report.failed > 0 {
        writeln!(out, "    {}", red.apply_to("Failures:"))?;
        for outcome in report.failures() {
            writeln!(
                out,
                "      task {:<4} (worker {}): {}",
                outcome.task_id, outcome.worker_id, outcome.message
            )?;
        }
    }

    Ok(())
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
