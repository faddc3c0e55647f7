//! CSRF token pairs and secure token generation.

use std::fmt;
use std::time::{Duration, SystemTime};

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Errors raised while issuing tokens.
#[derive(Debug, Error)]
pub enum CsrfError {
    /// The operating system RNG could not produce bytes.
    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(String),
}

/// A header/cookie token pair. Read-only once issued.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Nonce sent in the `X-CSRF-Token` header. Store key.
    pub header_token: String,
    /// Nonce stored in the CSRF cookie.
    pub cookie_token: String,
    /// Issue time.
    pub issued_at: SystemTime,
}

impl TokenPair {
    /// Generate a fresh pair with two independently drawn tokens.
    pub fn generate(issued_at: SystemTime) -> Result<Self, CsrfError> {
        let header_token = random_token()?;
        let mut cookie_token = random_token()?;
        while cookie_token == header_token {
            cookie_token = random_token()?;
        }

        Ok(Self {
            header_token,
            cookie_token,
            issued_at,
        })
    }

    /// True once more than `ttl` has elapsed since issue.
    pub fn is_expired(&self, now: SystemTime, ttl: Duration) -> bool {
        now.duration_since(self.issued_at).unwrap_or_default() > ttl
    }

    /// Instant after which the pair stops validating.
    pub fn expires_at(&self, ttl: Duration) -> SystemTime {
        self.issued_at + ttl
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("header_token", &redact(&self.header_token))
            .field("cookie_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Short prefix of a token, safe for logs.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{}…", prefix)
}

/// Draw [`TOKEN_BYTES`] from the OS RNG and hex-encode them.
pub fn random_token() -> Result<String, CsrfError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CsrfError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}
