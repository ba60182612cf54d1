//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `level` - Default filter directive (e.g. `info`, `debug`, `prism_core=trace`).
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout is reserved for the report)
/// - The RUST_LOG environment variable can override the log level
pub fn init(level: &str, json_format: bool) {
    // Build the filter, respecting RUST_LOG if set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging with configuration from Config.
///
/// `--verbose` raises the level to debug; `--json-logs` forces JSON output.
pub fn init_from_config(
    config: &prism_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let (level, json_format) = resolve(config, verbose_override, json_logs_override);
    init(level, json_format);
}

fn resolve(config: &prism_core::Config, verbose: bool, json_logs: bool) -> (&str, bool) {
    let level = if verbose && !matches!(config.logging.level.as_str(), "trace") {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    (level, json_logs || config.logging.format == "json")
}
