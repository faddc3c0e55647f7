//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set. `log_format = "json"`
//! switches to one JSON object per line for log shipping.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

/// Default directives when `RUST_LOG` is absent.
fn default_directives(level: &str) -> String {
    format!("booking_guard={level},tower_http={level}")
}

/// Install the global subscriber. Calling it twice is harmless; the second call is ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_ok() {
        tracing::debug!(level = %config.log_level, format = %config.log_format, "Logging initialized");
    }
}
