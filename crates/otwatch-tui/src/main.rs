//! `otwatch` — terminal console for the otwatch ICS/OT security monitor.
//!
//! Built on [ratatui](https://ratatui.rs). Pages are navigable via number
//! keys (1-8): Dashboard, Devices, Threats, Monitoring, AI Models,
//! Topology, PCAP, and Workflows. PCAP and workflow pages talk to the
//! otwatch backend over REST; everything else runs on seeded fixture data
//! refreshed by a local telemetry ticker.
//!
//! Logs are written to a file (default `/tmp/otwatch.log`) to avoid
//! corrupting the terminal UI.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app
//! launch.

mod action;
mod app;
mod component;
mod event;
mod page;
mod panels;
mod screens;
mod theme;
mod ticker;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use otwatch_api::{PcapService, RestClient, TransportConfig, WorkflowService};
use otwatch_config::load_config_or_default;

use crate::app::App;

/// Terminal console for monitoring a simulated OT/ICS environment.
#[derive(Parser, Debug)]
#[command(name = "otwatch", version, about)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(short = 'u', long, env = "OTWATCH_URL")]
    url: Option<String>,

    /// Directory where exports and downloads are written
    #[arg(short = 'e', long)]
    export_dir: Option<PathBuf>,

    /// Log file path
    #[arg(long, default_value = "/tmp/otwatch.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Logging to stdout/stderr would corrupt the
/// TUI, so everything goes to a file. The returned guard must be held for
/// the lifetime of the application so logs flush on exit.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otwatch={log_level}")));

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("otwatch.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal.
    tui::install_hooks()?;

    // Tracing to file; hold the guard so logs flush on exit.
    let _log_guard = setup_tracing(&cli);

    let mut config = load_config_or_default();
    if let Some(url) = &cli.url {
        config.base_url.clone_from(url);
    }
    if cli.export_dir.is_some() {
        config.export_dir.clone_from(&cli.export_dir);
    }

    let base_url = config.base_url().wrap_err("invalid backend URL")?;
    let transport = TransportConfig {
        request_timeout: Duration::from_secs(config.request_timeout),
        probe_timeout: Duration::from_secs(config.probe_timeout),
    };

    info!(url = %base_url, "starting otwatch");

    let pcap = PcapService::new(RestClient::new(base_url.clone(), &transport)?);
    let workflows = WorkflowService::new(RestClient::new(base_url, &transport)?);

    let mut app = App::new(
        pcap,
        workflows,
        config.admin_password(),
        config.export_dir(),
    );
    app.run().await?;

    Ok(())
}
