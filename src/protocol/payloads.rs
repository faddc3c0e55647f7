//! Payloads exchanged inside envelopes and error bodies.

use serde::{Deserialize, Serialize};

use crate::protocol::envelope::ApiError;

/// `data` of a successful token issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    /// Value to send back in `X-CSRF-Token`.
    pub header_token: String,
    /// Seconds until the pair stops validating.
    pub expires_in: u64,
}

/// Body of a 429 response. Still a valid `success: false` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitBody {
    pub success: bool,
    pub error: ApiError,
    /// Seconds until the window resets.
    pub retry_after: u64,
    pub remaining: u32,
}

impl RateLimitBody {
    pub fn new(retry_after: u64, remaining: u32) -> Self {
        Self {
            success: false,
            error: ApiError::new("RATE_LIMITED", "Too many requests, retry later"),
            retry_after,
            remaining,
        }
    }
}
