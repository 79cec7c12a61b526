mod app;
mod config;
mod input;
mod model;
mod render;
mod session;
mod sim;
mod storage;
mod thoughts;

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// The terminal belongs to the UI, so logs go to a file in the data directory.
fn init_logging(log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("could not open log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PIXELPUP_LOG").unwrap_or_else(|_| EnvFilter::new("pixelpup=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = config::Cli::parse();
    let paths = config::project_paths(cli.data_dir.as_deref())?;
    init_logging(&paths.log_path)?;
    tracing::info!(data_dir = %paths.data_dir.display(), "pixelpup starting");

    app::run(&cli, &paths)
}
