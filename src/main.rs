//! IdP-initiated SSO redirector.
//!
//! # Architecture Overview
//!
//! ```text
//!     IdP POST /  ──▶ http server ──▶ redirect resolver ──▶ 302 login page
//!                        │                 │    │
//!                        │                 │    └──▶ error page / 500
//!                        │                 ▼
//!                        │           allowlist cache ◀── document store
//!                        ▼                                   ▲
//!     admin PUT/GET /api ──▶ admin handlers ─────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use idp_redirector::config::load_config;
use idp_redirector::lifecycle::{spawn_signal_handler, Shutdown};
use idp_redirector::observability::{logging, metrics};
use idp_redirector::HttpServer;

#[derive(Parser)]
#[command(name = "idp-redirector", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "redirector.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "idp-redirector starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        issuer = %config.identity.issuer(),
        storage = ?config.storage.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let server = HttpServer::from_config(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    spawn_signal_handler(shutdown.clone());

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
