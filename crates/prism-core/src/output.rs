//! Machine-readable output for run summaries.
//!
//! JSON writes the whole [`RunSummary`] as one document. JSON Lines writes
//! one record per outcome followed by a single summary record, so a consumer
//! can stream outcomes without buffering the report.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{InputStatus, Outcome, RunSummary, TransformKind};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table, rendered by the CLI
    Text,
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One line of JSON Lines output.
#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record<'a> {
    Outcome(&'a Outcome),
    Summary(SummaryLine<'a>),
}

/// Run-level totals without the outcome list.
#[derive(Serialize)]
struct SummaryLine<'a> {
    kind: TransformKind,
    input: &'a InputStatus,
    tasks_emitted: usize,
    workers: usize,
    expected: usize,
    total: usize,
    successful: usize,
    failed: usize,
    complete: bool,
    mean_duration_ms: f64,
    elapsed_ms: f64,
    throughput: f64,
}

impl<'a> From<&'a RunSummary> for SummaryLine<'a> {
    fn from(summary: &'a RunSummary) -> Self {
        let report = &summary.report;
        Self {
            kind: summary.kind,
            input: &summary.input,
            tasks_emitted: summary.tasks_emitted,
            workers: summary.workers,
            expected: report.expected,
            total: report.total,
            successful: report.successful,
            failed: report.failed,
            complete: report.complete,
            mean_duration_ms: report.mean_duration.as_secs_f64() * 1000.0,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1000.0,
            throughput: summary.throughput(),
        }
    }
}

/// Serializes run summaries as JSON or JSON Lines.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> ReportWriter<W> {
    /// Create a new report writer.
    ///
    /// `pretty` only affects [`OutputFormat::Json`]. [`OutputFormat::Text`]
    /// is rejected at write time; text rendering is the caller's job.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a complete run summary.
    pub fn write_summary(&mut self, summary: &RunSummary) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, summary)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, summary).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                // JSONL is never pretty-printed (one object per line)
                for outcome in &summary.report.outcomes {
                    self.write_line(&Record::Outcome(outcome))?;
                }
                self.write_line(&Record::Summary(SummaryLine::from(summary)))?;
            }
            OutputFormat::Text => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "text output is rendered by the caller",
                ));
            }
        }
        Ok(())
    }

    fn write_line(&mut self, record: &Record<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Convenience function to serialize a summary to a JSON string.
pub fn to_json(summary: &RunSummary, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(summary)
    } else {
        serde_json::to_string(summary)
    }
}
