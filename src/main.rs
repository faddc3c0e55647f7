//! booking-guard server.
//!
//! ```text
//!     Client Request
//!     ─────────▶ request id / trace / timeout / body limit / metrics
//!                    │
//!                    ▼
//!               CSRF guard ──(403)──▶
//!                    │
//!                    ▼
//!               rate limiter ──(429)──▶
//!                    │
//!                    ▼
//!        /api/v1/csrf-token, /api/v1/echo
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use axum::routing::post;
use axum::Router;
use booking_guard::config::{load_config, GuardConfig};
use booking_guard::http::handlers::echo;
use booking_guard::lifecycle::{shutdown_signal, Shutdown};
use booking_guard::observability::{logging, metrics};
use booking_guard::HttpServer;

#[derive(Parser)]
#[command(name = "booking-guard")]
#[command(about = "CSRF and rate-limit guard for the booking API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "booking-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        enforcement = config.csrf.enforcement.as_str(),
        token_ttl_secs = config.csrf.ttl_secs,
        rate_limit_window_ms = config.rate_limit.window_ms,
        rate_limit_max = config.rate_limit.max_requests,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let api = Router::new().route("/api/v1/echo", post(echo));
    let server = HttpServer::new(config, api);

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
