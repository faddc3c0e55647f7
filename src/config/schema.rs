//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::protocol::headers::DEFAULT_CSRF_COOKIE;
use crate::resilience::backoff::Backoff;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// CSRF token issuing and validation.
    pub csrf: CsrfConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Resilient client settings (used by `guard-cli` and embedding applications).
    pub client: ClientConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Server-side timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// What the server does with a request that fails CSRF validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// Reject with 403.
    #[default]
    Enforce,
    /// Log and let the request through.
    Observe,
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Enforcement::Enforce => "enforce",
            Enforcement::Observe => "observe",
        }
    }
}

/// When the CSRF cookie carries the `Secure` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CookieSecure {
    /// Only when the request arrived over HTTPS.
    #[default]
    Auto,
    Always,
    Never,
}

/// CSRF configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Token lifetime in seconds. Also the cookie Max-Age.
    pub ttl_secs: u64,

    /// Name of the cookie carrying the cookie token.
    pub cookie_name: String,

    /// Reject or only log failed validations.
    pub enforcement: Enforcement,

    /// `Secure` attribute policy for the cookie.
    pub secure_cookie: CookieSecure,

    /// Interval of the background expiry sweep in seconds.
    pub sweep_interval_secs: u64,

    /// Value sent in `X-Client-Version`.
    pub client_version: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            enforcement: Enforcement::Enforce,
            secure_cookie: CookieSecure::Auto,
            sweep_interval_secs: 60,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Requests allowed per identity per window.
    pub max_requests: u32,

    /// Header set by an upstream auth layer identifying the caller.
    /// Falls back to the peer IP when absent.
    pub identity_header: Option<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60_000,
            max_requests: 60,
            identity_header: None,
        }
    }
}

/// Resilient client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server origin, e.g. "http://127.0.0.1:8080".
    pub base_url: String,

    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,

    /// Total attempts per logical request (1 = no retries).
    pub max_attempts: u32,

    /// API version segment: endpoints resolve to `{base_url}/api/{api_version}/{endpoint}`.
    pub api_version: String,

    /// Service name used in logs and metrics.
    pub service_name: String,

    /// Endpoint issuing CSRF pairs, relative to the API root.
    pub csrf_endpoint: String,

    /// Backoff policy.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 10_000,
            max_attempts: 3,
            api_version: "v1".to_string(),
            service_name: "booking-guard-client".to_string(),
            csrf_endpoint: "csrf-token".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds.
    pub max_delay_ms: u64,

    /// Delay growth shape.
    pub backoff: Backoff,

    /// HTTP statuses that trigger a retry. 429 is rejected by validation:
    /// the client always reports it as `ClientError::RateLimited`.
    pub retryable_statuses: Vec<u16>,

    /// Extra random delay as a fraction of the computed delay, 0.0 to 1.0
    /// (0.0 disables). The slept delay still never exceeds `max_delay_ms`.
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff: Backoff::Exponential,
            retryable_statuses: vec![408, 500, 502, 503, 504],
            jitter_ratio: 0.0,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
