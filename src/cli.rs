use crate::client::ControlClient;
use crate::model::PanelConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "service-panel",
    version,
    about = "Control panel for start/stoppable backend services"
)]
pub struct Cli {
    /// Base URL of the service manager's status/control API
    #[arg(long, env = "SERVICE_PANEL_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Status refresh interval (0s disables polling)
    #[arg(long, default_value = "5s")]
    pub poll_interval: humantime::Duration,

    /// How long a notification stays on screen
    #[arg(long, default_value = "3s")]
    pub notification_duration: humantime::Duration,

    /// Print the status snapshot as JSON and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print the panel as text and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Log file used while the TUI owns the terminal
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `service_panel=debug` (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn is_one_shot(&self) -> bool {
        self.json || self.text || cfg!(not(feature = "tui"))
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json {
        return run_json(args).await;
    }

    if !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    run_text(args).await
}

/// Build a `PanelConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> PanelConfig {
    PanelConfig {
        base_url: args.base_url.clone(),
        poll_interval: Duration::from(args.poll_interval),
        notification_duration: Duration::from(args.notification_duration),
        user_agent: format!("service-panel/{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn fetch_once(args: &Cli) -> Result<crate::model::StatusSnapshot> {
    let cfg = build_config(args);
    let client = ControlClient::new(&cfg)?;
    let snapshot = client
        .fetch_status()
        .await
        .with_context(|| format!("fetch status from {}", client.status_url()))?;
    tracing::info!(services = snapshot.len(), "fetched status");
    Ok(snapshot)
}

async fn run_json(args: Cli) -> Result<()> {
    let snapshot = fetch_once(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();
    let out = serde_json::to_string_pretty(&snapshot)?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let snapshot = fetch_once(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();
    let _ = out_tx.send(OutputLine::Stderr(format!("Status from {}", args.base_url)));
    let summary = crate::text_summary::build_text_summary(&snapshot);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
