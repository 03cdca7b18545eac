//! Edge gateway binary.
//!
//! ```text
//!                    ┌───────────────────────────────────────────┐
//!                    │               EDGE GATEWAY                 │
//!   browser ────────▶│  /auth/*  → auth handlers ──▶ user service │
//!                    │                 │        └──▶ orchestrator │
//!                    │  other    → identity ──▶ proxy ──▶ core    │
//!   browser ◀────────│  paths      middleware    rewrites  service│
//!                    └───────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use edge_gateway::config::loader::load_config;
use edge_gateway::{GatewayConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "edge-gateway", about = "Edge gateway for browser clients")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "edge_gateway={},tower_http=info",
                    config.observability.log_level
                ))
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.auth.signing_secret == "CHANGE_ME_IN_PRODUCTION" {
        tracing::warn!("Signing secret is the placeholder default; set auth.signing_secret");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_url = %config.listener.public_url,
        core_service = %config.upstreams.core_service_url,
        user_service = %config.upstreams.user_service_url,
        saga_orchestrator = %config.upstreams.saga_orchestrator_url,
        saga_enabled = config.saga.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => edge_gateway::observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
