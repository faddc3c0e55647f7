//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges. All errors are collected
//! rather than stopping at the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GuardConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let csrf = &config.csrf;
    if csrf.ttl_secs == 0 {
        errors.push(ValidationError::new("csrf.ttl_secs", "must be greater than 0"));
    }
    if csrf.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("csrf.sweep_interval_secs", "must be greater than 0"));
    }
    if csrf.cookie_name.is_empty()
        || !csrf
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "csrf.cookie_name",
            "must be non-empty and contain only [A-Za-z0-9_-]",
        ));
    }

    let limit = &config.rate_limit;
    if limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be greater than 0"));
    }
    if limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be at least 1"));
    }

    let client = &config.client;
    if url::Url::parse(&client.base_url).is_err() {
        errors.push(ValidationError::new(
            "client.base_url",
            format!("'{}' is not a valid URL", client.base_url),
        ));
    }
    if client.timeout_ms == 0 {
        errors.push(ValidationError::new("client.timeout_ms", "must be greater than 0"));
    }
    if client.max_attempts == 0 {
        errors.push(ValidationError::new("client.max_attempts", "must be at least 1"));
    }
    if client.api_version.is_empty() {
        errors.push(ValidationError::new("client.api_version", "must not be empty"));
    }

    let retry = &client.retry;
    if retry.base_delay_ms > retry.max_delay_ms {
        errors.push(ValidationError::new(
            "client.retry.base_delay_ms",
            format!(
                "{} exceeds max_delay_ms {}",
                retry.base_delay_ms, retry.max_delay_ms
            ),
        ));
    }
    if let Some(bad) = retry
        .retryable_statuses
        .iter()
        .find(|s| !(100..=599).contains(*s))
    {
        errors.push(ValidationError::new(
            "client.retry.retryable_statuses",
            format!("{} is not an HTTP status", bad),
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        errors.push(ValidationError::new(
            "client.retry.jitter_ratio",
            "must be between 0.0 and 1.0",
        ));
    }
    if retry.retryable_statuses.contains(&429) {
        errors.push(ValidationError::new(
            "client.retry.retryable_statuses",
            "429 is never retried; the client surfaces it as a rate-limit error",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }
    if !matches!(obs.log_format.to_ascii_lowercase().as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "must be \"pretty\" or \"json\"",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
