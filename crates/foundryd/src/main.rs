//! foundryd — the Foundry daemon.
//!
//! Single binary that assembles the build monitor:
//! - Build store (Postgres)
//! - Docker event source
//! - Event correlator
//! - Notification sink (WebSocket)
//!
//! # Usage
//!
//! ```text
//! foundryd run --config foundry.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use foundry_core::FoundryConfig;

#[derive(Parser)]
#[command(name = "foundryd", about = "Foundry build monitor daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch container events and record build timelines.
    Run {
        /// Path to foundry.toml.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the Postgres connection string.
        #[arg(long)]
        database_url: Option<String>,

        /// Override the WebSocket sink port.
        #[arg(long)]
        sink_port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,foundryd=debug,foundry=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            database_url,
            sink_port,
        } => run(config, database_url, sink_port).await,
    }
}

async fn run(
    config_path: Option<PathBuf>,
    database_url: Option<String>,
    sink_port: Option<u16>,
) -> anyhow::Result<()> {
    info!("Foundry daemon starting");

    let config = match &config_path {
        Some(path) => FoundryConfig::from_file(path)?,
        None => FoundryConfig::default(),
    };
    let database_url = database_url.as_deref().unwrap_or_else(|| config.database_url());
    let sink_port = sink_port.unwrap_or_else(|| config.sink_port());

    // ── Initialize subsystems ──────────────────────────────────

    // Build store.
    let store = foundry_store::PgStore::connect(database_url, config.max_connections()).await?;
    info!("build store ready");

    // Event source.
    let source = foundry_source::EventSource::connect(config.managed_value())?;
    let events = source.subscribe();
    info!(managed_value = config.managed_value(), "event source subscribed");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    // Correlation loop.
    let correlator = foundry_correlator::Correlator::new(store);
    let correlator_handle = tokio::spawn(correlator.run(events, shutdown_rx.clone()));

    // Notification sink.
    let sink_addr = SocketAddr::from(([0, 0, 0, 0], sink_port));
    let sink = foundry_sink::NotificationSink::new(sink_addr);
    let sink_handle = tokio::spawn(sink.serve(shutdown_rx));

    // Graceful shutdown on Ctrl-C. In-flight writes are not rolled back.
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let _ = correlator_handle.await;
    let _ = sink_handle.await;

    info!("Foundry daemon stopped");
    Ok(())
}
