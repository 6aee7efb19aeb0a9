//! security-relay
//!
//! Public front door for browser security reports.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser POST /api/{project_id}/security/
//!         │
//!         ▼
//!     ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//!     │   http   │──▶│ project  │──▶│  report  │──▶│  origin  │──▶│  event   │
//!     │cors/limit│   │ key check│   │ classify │   │allow-list│   │normalize │
//!     └──────────┘   └──────────┘   │  + parse │   └──────────┘   └────┬─────┘
//!                                   └──────────┘                       │
//!                                                                      ▼
//!                         upstream ◀── Forwarder ◀── queue ◀──── envelope::Emitter
//!
//!     Cross-cutting: config (+ watcher), observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use security_relay::config::{load_config, watcher::ConfigWatcher, RelayConfig};
use security_relay::envelope::{Forwarder, QueueSink};
use security_relay::lifecycle::{shutdown_signal, Shutdown};
use security_relay::observability::{init_logging, init_metrics};
use security_relay::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "security-relay", version, about = "Ingest browser security reports")]
struct Args {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "security-relay starting");
    if args.config.is_none() {
        tracing::warn!("No config file given, running with defaults and no projects");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        projects = config.projects.len(),
        upstream = config.upstream.url.as_deref().unwrap_or("none"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();

    let (sink, queue) = QueueSink::new(config.upstream.queue_size);
    let forwarder = Forwarder::new(queue, &config.upstream)?;
    let forwarder_task = tokio::spawn(forwarder.run(shutdown.subscribe()));

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, Arc::new(sink));
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    shutdown_signal().await;
    tracing::info!("Shutting down");
    shutdown.trigger();

    server_task.await??;
    forwarder_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
