//! Filtering forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                 FILTERING PROXY                   │
//!                       │                                                   │
//!   Client Request      │  ┌──────────┐   ┌──────────┐   ┌──────────────┐  │
//!   ────────────────────┼─▶│   net    │──▶│   http   │──▶│    filter    │  │
//!                       │  │ listener │   │ framer + │   │ referer +    │──┼──▶ 403
//!                       │  └──────────┘   │  parser  │   │ blocklist    │  │
//!                       │                 └──────────┘   └──────┬───────┘  │
//!                       │                                       ▼          │
//!                       │                                ┌──────────────┐  │
//!   Client Response     │  ┌──────────┐   ┌──────────┐   │    cache     │  │
//!   ◀───────────────────┼──│serialize │◀──│  censor  │◀──│ hit or miss  │◀─┼──── Origin
//!                       │  └──────────┘   └──────────┘   └──────────────┘  │     Server
//!                       │                                                   │
//!                       │  config · lifecycle · observability · resilience  │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;

use filtering_proxy::cli::Cli;
use filtering_proxy::config::validation::validate_config;
use filtering_proxy::lifecycle::{prepare_state, signals, Shutdown};
use filtering_proxy::net::Listener;
use filtering_proxy::observability::{logging, metrics};
use filtering_proxy::ProxyServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("filtering-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        port = config.listener.port,
        max_connections = config.listener.max_connections,
        blocklist = ?config.files.blocklist,
        words = ?config.files.words,
        cache_dir = ?config.files.cache_dir,
        "Configuration loaded"
    );

    let state = Arc::new(prepare_state(&config)?);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server = ProxyServer::new(state, config.timeouts.shutdown_grace());
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
