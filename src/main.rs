//! Media Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   MEDIA PROXY                    │
//!                         │                                                  │
//!   GET /download ────────┼─▶ extractor ──────────────▶ scraping service     │
//!                         │                                                  │
//!   GET /file   ──────────┼─▶ media::resolver                                │
//!   GET /stream           │      → media::token  (header hints in ?token=)   │
//!                         │      → media::headers (defaults + token headers) │
//!                         │      → upstream ─────────────────────▶ origin    │
//!                         │                                          │       │
//!   ◀─────────────────────┼── http::body (chunked relay) ◀───────────┘       │
//!                         │      → scratch purge once (/file only)           │
//!                         │                                                  │
//!                         │  config · observability · lifecycle              │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use media_proxy::config::{apply_env_overrides, load_config, ProxyConfig};
use media_proxy::lifecycle::{bind_listener, signals, Shutdown};
use media_proxy::observability::{logging, metrics};
use media_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "media-proxy")]
#[command(about = "Relay social media downloads through a streaming proxy", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port (takes precedence over PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    apply_env_overrides(&mut config);
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);

    tracing::info!("media-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        prefix = %config.api.prefix,
        extractor = config.extractor.endpoint.as_deref().unwrap_or("none"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = bind_listener(&config.listener).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
