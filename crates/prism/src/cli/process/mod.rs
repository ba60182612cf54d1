//! The `prism process` command: run the transformation pipeline.

mod progress;
mod report;
pub mod types;

pub use types::{OutputFormat, TransformArg};

use clap::Args;
use prism_core::pipeline::{EventSink, FanoutSink, TracingSink};
use prism_core::{Config, InputStatus, Pipeline, ReportWriter, RunRequest, RunSummary};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use progress::ProgressSink;
use report::render_text;

/// Arguments for the `process` command.
///
/// Every option falls back to the configuration file when omitted.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Transform to apply to every task
    #[arg(short, long, value_enum)]
    pub transform: Option<TransformArg>,

    /// Directory holding the source images
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for transformed images (created if missing)
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of tasks to generate
    #[arg(short = 'n', long)]
    pub tasks: Option<usize>,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Task channel capacity
    #[arg(long)]
    pub task_buffer: Option<usize>,

    /// Result channel capacity
    #[arg(long)]
    pub result_buffer: Option<usize>,

    /// Seed for source selection (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the process command.
///
/// Fails after printing the report if the input location does not exist.
pub async fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args)?;
    let request = RunRequest::from_config(&config);
    let format = resolve_format(&args, &config)?;
    let pretty = config.output.pretty;

    tracing::info!(
        "Running {} on {:?} ({} tasks, {} workers)",
        request.kind,
        request.input_dir,
        request.num_tasks,
        request.workers
    );

    let progress = Arc::new(if args.no_progress || !console::Term::stderr().is_term() {
        ProgressSink::hidden()
    } else {
        ProgressSink::new()
    });
    let events: Arc<dyn EventSink> = Arc::new(
        FanoutSink::new()
            .with(Arc::new(TracingSink))
            .with(progress.clone()),
    );

    let pipeline = Pipeline::new(config).with_events(events);
    let summary = pipeline.run(request).await?;
    progress.finish();

    match &args.report {
        Some(path) => {
            let file = File::create(path)?;
            write_report(BufWriter::new(file), &summary, format, pretty)?;
            tracing::info!("Report written to {:?}", path);
        }
        None => write_report(std::io::stdout().lock(), &summary, format, pretty)?,
    }

    if let InputStatus::NotFound { path } = &summary.input {
        anyhow::bail!(
            "Input location does not exist: {:?}\n\n  Hint: run `prism assets` to create test images.",
            path
        );
    }
    Ok(())
}

/// Fold command-line overrides into the configuration and re-validate.
fn apply_overrides(mut config: Config, args: &ProcessArgs) -> anyhow::Result<Config> {
    if let Some(transform) = args.transform {
        config.transform.default_kind = transform.into();
    }
    if let Some(ref input) = args.input {
        config.paths.input_dir = expand(input);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.paths.output_dir = expand(output_dir);
    }
    if let Some(tasks) = args.tasks {
        config.processing.num_tasks = tasks;
    }
    if let Some(workers) = args.workers {
        config.processing.workers = workers;
    }
    if let Some(size) = args.task_buffer {
        config.pipeline.task_buffer_size = size;
    }
    if let Some(size) = args.result_buffer {
        config.pipeline.result_buffer_size = size;
    }
    if args.seed.is_some() {
        config.processing.seed = args.seed;
    }
    if let Some(format) = args.format {
        config.output.format = format.to_string();
    }

    config.validate()?;
    Ok(config)
}

fn resolve_format(args: &ProcessArgs, config: &Config) -> anyhow::Result<prism_core::OutputFormat> {
    if let Some(format) = args.format {
        return Ok(format.into());
    }
    let name = &config.output.format;
    prism_core::OutputFormat::parse(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {name}"))
}

fn write_report<W: Write>(
    mut writer: W,
    summary: &RunSummary,
    format: prism_core::OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    match format {
        prism_core::OutputFormat::Text => {
            writer.write_all(render_text(summary).as_bytes())?;
            writer.flush()?;
        }
        _ => {
            let mut report_writer = ReportWriter::new(writer, format, pretty);
            report_writer.write_summary(summary)?;
            report_writer.flush()?;
        }
    }
    Ok(())
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
