//! Client error taxonomy.

use std::time::Duration;
use thiserror::Error;

use crate::protocol::ContractViolation;

/// Network-level failure of a single attempt. Always retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Deadline passed; the in-flight call was cancelled.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS handshake failure.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The call was aborted before a response arrived.
    #[error("request aborted: {0}")]
    Aborted(String),

    /// Any other I/O failure while sending or reading the response.
    #[error("network I/O failed: {0}")]
    Io(String),
}

impl TransportError {
    /// Metric/log label.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Connect(_) => "connect",
            TransportError::Aborted(_) => "aborted",
            TransportError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(Duration::ZERO)
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_request() {
            TransportError::Aborted(e.to_string())
        } else {
            TransportError::Io(e.to_string())
        }
    }
}

/// Why an attempt was considered failed and worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response status is in the retryable set.
    #[error("retryable status {status}")]
    Status { status: u16 },
}

/// Errors surfaced by [`ResilientHttpClient`](crate::client::ResilientHttpClient).
///
/// Business failures (`success: false`) are not errors: they are returned as envelopes.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Every attempt failed with a transport error or retryable status.
    #[error("request failed after {attempts} attempt(s): {last}")]
    Network { attempts: u32, last: AttemptFailure },

    /// The backend answered with something that is not a valid envelope.
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),

    /// The server's rate limiter refused the request. Not retried.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64, remaining: u32 },

    /// The request could not be built (bad URL, unserializable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Token endpoint answered without a usable token pair.
    #[error("CSRF session could not be established: {0}")]
    Session(String),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ClientError::ContractViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Network {
            attempts: 3,
            last: AttemptFailure::Status { status: 503 },
        };
        assert_eq!(err.to_string(), "request failed after 3 attempt(s): retryable status 503");

        let err = ClientError::Network {
            attempts: 2,
            last: TransportError::Timeout(Duration::from_millis(500)).into(),
        };
        assert!(err.to_string().contains("timed out after 500ms"));
        assert!(err.is_network());
    }

    #[test]
    fn test_transport_kinds() {
        assert_eq!(TransportError::Timeout(Duration::ZERO).kind(), "timeout");
        assert_eq!(TransportError::Connect("refused".into()).kind(), "connect");
    }
}
