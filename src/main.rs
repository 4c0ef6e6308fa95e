//! reagent-site front server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 reagent-site                  │
//!   Client Request     │  ┌───────────┐    ┌──────────┐               │
//!   ───────────────────┼─▶│ request id│───▶│ forward  │───────────────┼──▶ Site
//!                      │  │ + trace   │    │ (client) │               │    server
//!                      │  └───────────┘    └────┬─────┘               │
//!                      │                        ▼                     │
//!   Client Response    │  ┌───────────┐    ┌──────────┐               │
//!   ◀──────────────────┼──│compression│◀───│ rewrite  │◀──────────────┼───
//!                      │  └───────────┘    │  (HTML)  │               │
//!                      │                   └──────────┘               │
//!                      │   config (+ hot reload) · logging · metrics   │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use reagent_site::config::{load_config, watcher::ConfigWatcher, SiteConfig};
use reagent_site::observability::{logging, metrics};
use reagent_site::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "reagent-site")]
#[command(about = "Front server that post-processes the site's HTML", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes when given.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SiteConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("reagent-site v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, mpsc::unbounded_channel().1),
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
