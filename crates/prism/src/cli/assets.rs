//! The `prism assets` command: write synthetic test images.

use clap::Args;
use prism_core::assets::{self, Pattern};
use prism_core::Config;
use std::path::PathBuf;

/// Arguments for the `assets` command.
#[derive(Args, Debug)]
pub struct AssetsArgs {
    /// Target directory (defaults to the configured input directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

/// Execute the assets command.
pub async fn execute(args: AssetsArgs, config: Config) -> anyhow::Result<()> {
    let dir = match args.dir {
        Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned()),
        None => config.input_dir(),
    };

    let written = tokio::task::spawn_blocking(move || assets::generate(&dir)).await??;

    for (path, pattern) in written.iter().zip(Pattern::ALL) {
        println!("{}  ({})", path.display(), pattern.description());
    }
    tracing::info!("Created {} test images", written.len());
    Ok(())
}
