//! Canonical Router server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────▶ net::listener ──▶ http::server ──▶ routing::Dispatcher
//!                 (tcp/tls/unix)    (middleware)        │
//!                                                       ├─ NotFound  → 404
//!                                                       ├─ Redirect  → 301 Location
//!                                                       └─ Executed  → handler response
//!
//!     config file ──▶ config::watcher ──▶ new RouteTable ──▶ Dispatcher::replace
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use canonical_router::config::{catalog, load_config, watcher::ConfigWatcher, ServerConfig};
use canonical_router::http::HttpServer;
use canonical_router::lifecycle::{signals, Shutdown};
use canonical_router::net::listener;
use canonical_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "canonical-router")]
#[command(about = "HTTP router with canonical-path redirects", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not reload routes when the configuration file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "canonical-router starting");

    tracing::info!(
        listener = ?config.listener.kind,
        routes = config.routes.len(),
        request_timeout_secs = config.limits.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let table = catalog::build_table(&config.routes).map_err(|errors| {
        errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    })?;

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, updates) = match cli.config.as_deref().filter(|_| !cli.no_watch) {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => (None, tokio::sync::mpsc::unbounded_channel().1),
    };

    let bound = listener::bind(&config.listener).await?;
    tracing::info!(listener = %bound, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    signals::spawn_signal_handler(Arc::clone(&shutdown));

    let server = HttpServer::new(config, table);
    server.run(bound, updates, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
