//! Prism CLI - bounded-queue image transformation pipeline.
//!
//! Prism spreads a fixed number of image transformation tasks across a pool of
//! worker threads and prints a report of what succeeded and what failed.
//!
//! # Usage
//!
//! ```bash
//! # Create six test images in ./input_images
//! prism assets
//!
//! # Blur 20 randomly chosen images with 4 workers
//! prism process --transform blur --tasks 20 --workers 4
//!
//! # Machine-readable report
//! prism process --format jsonl > report.jsonl
//!
//! # View configuration
//! prism config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Prism - bounded-queue image transformation pipeline.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "PRISM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the transformation pipeline and print a report
    Process(cli::process::ProcessArgs),

    /// Write synthetic test images
    Assets(cli::assets::AssetsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(prism_core::Config::default_path);

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = if config_path.exists() {
        match prism_core::Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `prism config path`."
                );
                prism_core::Config::default()
            }
        }
    } else {
        prism_core::Config::default()
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Prism v{}", prism_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Assets(args) => cli::assets::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, &config_path).await,
    }
}
