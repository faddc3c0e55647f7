use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use booking_guard::client::{ClientError, RequestOptions, ResilientHttpClient};
use booking_guard::config::{load_config, GuardConfig};
use booking_guard::observability::logging;
use booking_guard::CsrfProtector;

use axum::http::Method;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Call a booking-guard protected API through the resilient client", long_about = None)]
struct Cli {
    /// Server origin. Overrides `client.base_url`.
    #[arg(short, long)]
    url: Option<String>,

    /// TOML config file (reads the `[client]` and `[csrf]` sections).
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Total attempts per request.
    #[arg(long)]
    attempts: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a CSRF pair and print the header token
    Token,
    /// Call an endpoint below /api/{version}/
    Call {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Endpoint relative to the API root, e.g. "appointments"
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        /// Do not fetch or attach a CSRF token
        #[arg(long)]
        skip_auth: bool,
        /// Per-attempt timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if let Some(attempts) = cli.attempts {
        config.client.max_attempts = attempts;
    }
    logging::init_logging(&config.observability);

    let protector = Arc::new(CsrfProtector::new(config.csrf.clone()));
    let client = ResilientHttpClient::new(config.client.clone(), protector)?;

    match cli.command {
        Commands::Token => {
            let session = client.establish_session().await?;
            println!("{}", session.header_token);
        }
        Commands::Call {
            method,
            path,
            data,
            skip_auth,
            timeout_ms,
        } => {
            let method: Method = method.to_ascii_uppercase().parse()?;
            let mut options = RequestOptions::new(method.clone());
            if let Some(data) = data {
                options = options.body(serde_json::from_str::<Value>(&data)?);
            }
            if let Some(ms) = timeout_ms {
                options = options.timeout(Duration::from_millis(ms));
            }
            if skip_auth {
                options = options.skip_auth();
            } else if booking_guard::client::is_state_changing(&method) {
                client.establish_session().await?;
            }

            match client.execute::<Value>(&path, options).await {
                Ok(envelope) => {
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                    if !envelope.success {
                        std::process::exit(1);
                    }
                }
                Err(ClientError::RateLimited { retry_after_secs, .. }) => {
                    eprintln!("Rate limited, retry after {}s", retry_after_secs);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
