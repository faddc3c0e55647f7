//! CSRF protector: issues, stores and validates double-submit pairs.

use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::config::CsrfConfig;
use crate::csrf::cookie;
use crate::csrf::store::{InMemoryTokenStore, TokenStore};
use crate::csrf::token::{redact, CsrfError, TokenPair};
use crate::observability::metrics;
use crate::protocol::headers::{
    X_CLIENT_TIMESTAMP, X_CLIENT_VERSION, X_CSRF_TOKEN, X_REQUESTED_WITH, XML_HTTP_REQUEST,
};

/// Why a header/cookie pair was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfRejection {
    MissingHeader,
    MissingCookie,
    UnknownToken,
    Expired,
    Mismatch,
}

impl CsrfRejection {
    /// Metric/log label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CsrfRejection::MissingHeader => "missing_header",
            CsrfRejection::MissingCookie => "missing_cookie",
            CsrfRejection::UnknownToken => "unknown_token",
            CsrfRejection::Expired => "expired",
            CsrfRejection::Mismatch => "mismatch",
        }
    }
}

/// Double-submit-cookie protector.
///
/// Constructed explicitly and shared via `Arc`; each instance owns its own store,
/// so isolated instances (tests, tenants) never see each other's tokens.
pub struct CsrfProtector {
    config: CsrfConfig,
    store: Arc<dyn TokenStore>,
}

impl CsrfProtector {
    /// Protector backed by an in-memory store.
    pub fn new(config: CsrfConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryTokenStore::new()))
    }

    /// Protector backed by a caller-supplied store.
    pub fn with_store(config: CsrfConfig, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    /// Issue a new pair stamped with the current time.
    pub fn issue_token_pair(&self) -> Result<TokenPair, CsrfError> {
        self.issue_token_pair_at(SystemTime::now())
    }

    /// Issue a new pair stamped with `now`. Expired pairs are swept first.
    pub fn issue_token_pair_at(&self, now: SystemTime) -> Result<TokenPair, CsrfError> {
        let swept = self.store.sweep_expired(now, self.ttl());
        if swept > 0 {
            tracing::debug!(swept, "Swept expired CSRF tokens");
        }

        let pair = TokenPair::generate(now).map_err(|e| {
            tracing::error!(error = %e, "Refusing to issue CSRF token without secure randomness");
            e
        })?;
        self.store.put(pair.clone());

        metrics::record_csrf_issued(self.store.len());
        tracing::debug!(token = %redact(&pair.header_token), "Issued CSRF token pair");
        Ok(pair)
    }

    /// Append a `Set-Cookie` carrying `cookie_token` to `headers`.
    pub fn write_cookie(&self, headers: &mut HeaderMap, cookie_token: &str, encrypted: bool) {
        let value = cookie::render_set_cookie(
            &self.config.cookie_name,
            cookie_token,
            self.config.ttl_secs,
            encrypted,
        );
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                headers.append(SET_COOKIE, v);
            }
            Err(_) => tracing::warn!("CSRF cookie value is not a valid header value, not written"),
        }
    }

    /// Append a `Set-Cookie` that deletes the CSRF cookie.
    pub fn clear_cookie(&self, headers: &mut HeaderMap, encrypted: bool) {
        let value = cookie::render_set_cookie(&self.config.cookie_name, "deleted", 0, encrypted);
        if let Ok(v) = HeaderValue::from_str(&value) {
            headers.append(SET_COOKIE, v);
        }
    }

    /// Read the CSRF cookie from request `Cookie` headers.
    pub fn read_cookie(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| cookie::find_in_cookie_header(v, &self.config.cookie_name))
    }

    /// True iff `(header_token, cookie_token)` matches a stored, unexpired pair.
    pub fn validate(&self, header_token: &str, cookie_token: &str, now: SystemTime) -> bool {
        self.check(header_token, cookie_token, now).is_ok()
    }

    /// Like [`validate`](Self::validate) but reports the reason for refusal.
    /// Expired pairs found here are evicted.
    pub fn check(
        &self,
        header_token: &str,
        cookie_token: &str,
        now: SystemTime,
    ) -> Result<(), CsrfRejection> {
        if header_token.is_empty() {
            return Err(CsrfRejection::MissingHeader);
        }
        if cookie_token.is_empty() {
            return Err(CsrfRejection::MissingCookie);
        }

        let pair = self
            .store
            .get(header_token)
            .ok_or(CsrfRejection::UnknownToken)?;

        if pair.is_expired(now, self.ttl()) {
            self.store.delete(header_token);
            return Err(CsrfRejection::Expired);
        }

        if bool::from(pair.cookie_token.as_bytes().ct_eq(cookie_token.as_bytes())) {
            Ok(())
        } else {
            Err(CsrfRejection::Mismatch)
        }
    }

    /// Drop a pair (sign-out). Returns whether it existed.
    pub fn invalidate(&self, header_token: &str) -> bool {
        let removed = self.store.delete(header_token).is_some();
        if removed {
            tracing::debug!(token = %redact(header_token), "Invalidated CSRF token pair");
        }
        removed
    }

    /// Sweep expired pairs, returning how many were removed.
    pub fn sweep(&self, now: SystemTime) -> usize {
        let removed = self.store.sweep_expired(now, self.ttl());
        metrics::record_csrf_active(self.store.len());
        removed
    }

    /// Pairs currently held, expired-but-unswept included.
    pub fn active_tokens(&self) -> usize {
        self.store.len()
    }

    /// Baseline headers for an outgoing API request, plus `X-CSRF-Token` when
    /// a header token is supplied.
    pub fn secure_headers(&self, header_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(X_REQUESTED_WITH),
            HeaderValue::from_static(XML_HTTP_REQUEST),
        );
        if let Ok(v) = HeaderValue::from_str(&self.config.client_version) {
            headers.insert(HeaderName::from_static(X_CLIENT_VERSION), v);
        }

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        headers.insert(HeaderName::from_static(X_CLIENT_TIMESTAMP), HeaderValue::from(now_ms as u64));

        if let Some(token) = header_token {
            match HeaderValue::from_str(token) {
                Ok(v) => {
                    headers.insert(HeaderName::from_static(X_CSRF_TOKEN), v);
                }
                Err(_) => tracing::warn!("Ignoring CSRF token that is not a valid header value"),
            }
        }
        headers
    }
}

impl std::fmt::Debug for CsrfProtector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfProtector")
            .field("ttl_secs", &self.config.ttl_secs)
            .field("cookie_name", &self.config.cookie_name)
            .field("enforcement", &self.config.enforcement)
            .field("tokens", &self.store.len())
            .finish()
    }
}
