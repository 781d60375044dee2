//! Geo-steered HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                    GEO BALANCER                       │
//!                        │                                                       │
//!   Client Request       │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ─────────────────────┼─▶│  http    │──▶│ routing  │──▶│  availability    │  │
//!                        │  │ server   │   │ steering │   │  strategy        │  │
//!                        │  └──────────┘   └──────────┘   └────────┬─────────┘  │
//!                        │                                         │            │
//!                        │                      ┌──────────────────┼─────────┐  │
//!                        │                      ▼                  ▼         │  │
//!                        │               ┌────────────┐    ┌────────────┐    │  │
//!                        │               │   health   │    │ forwarder  │────┼──┼──▶ Endpoints
//!                        │               │  checker   │    │ + retries  │    │  │
//!                        │               └────────────┘    └────────────┘    │  │
//!   Client Response      │                                                   │  │
//!   ◀────────────────────┼── observability headers ◀── response / recovery ◀─┘  │
//!                        │                                                       │
//!                        │  config (TOML, hot reload) · observability · lifecycle│
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use geo_balancer::config::{resolve_config, ConfigWatcher};
use geo_balancer::http::HttpServer;
use geo_balancer::lifecycle::{wait_for_signal, Shutdown};
use geo_balancer::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "geo-balancer", version, about = "Geo-steered HTTP load balancer")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "geo-balancer starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoints = config.endpoints.len(),
        geo_endpoints = config.geo_endpoints.len(),
        steering = ?config.steering.mode,
        availability = ?config.availability.mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher must stay alive for the whole run.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
