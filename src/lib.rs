//! Request security and resilience layer for the barbershop booking API.
//!
//! Server side: double-submit CSRF tokens and fixed-window rate limiting as
//! Axum middleware. Client side: a resilient HTTP client with per-attempt
//! timeouts, bounded retries and envelope contract validation.

// Wire contract
pub mod protocol;

// Core subsystems
pub mod client;
pub mod csrf;
pub mod http;
pub mod resilience;
pub mod security;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use client::{ClientError, RequestOptions, ResilientHttpClient};
pub use config::GuardConfig;
pub use csrf::CsrfProtector;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use protocol::ResponseEnvelope;
pub use resilience::RetryPolicy;
pub use security::RateLimiter;
