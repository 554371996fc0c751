mod cli;
mod client;
mod dispatch;
mod endpoint;
mod error;
mod logging;
mod model;
mod notify;
mod orchestrator;
mod reconcile;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    // Must happen while the process is still single-threaded.
    model::capture_local_offset();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("build tokio runtime")?
        .block_on(run())
}

async fn run() -> Result<()> {
    let args = cli::Cli::parse();
    let _log_guard = logging::init(&args)?;

    if let Err(e) = cli::run(args).await {
        tracing::error!(error = %format!("{e:#}"), "service-panel failed");
        return Err(e);
    }
    Ok(())
}
