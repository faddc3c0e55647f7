//! Resilient HTTP client.
//!
//! Runs one logical request to completion: security headers, per-attempt
//! deadline, envelope validation and retries with backoff. Callers see a
//! single result.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use url::Url;
use uuid::Uuid;

use crate::client::error::{AttemptFailure, ClientError};
use crate::client::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::config::ClientConfig;
use crate::csrf::cookie::find_in_set_cookie;
use crate::csrf::token::redact;
use crate::csrf::CsrfProtector;
use crate::observability::metrics;
use crate::protocol::headers::X_REQUEST_ID;
use crate::protocol::{RateLimitBody, ResponseEnvelope, TokenGrant};
use crate::resilience::retries::{AttemptOutcome, RetryPolicy};
use crate::resilience::timeouts::with_deadline;

/// Token pair held by the client for the current session.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfSession {
    pub header_token: String,
    pub cookie_token: String,
}

impl fmt::Debug for CsrfSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrfSession")
            .field("header_token", &redact(&self.header_token))
            .field("cookie_token", &"<redacted>")
            .finish()
    }
}

/// Per-call options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Send without CSRF header/cookie.
    pub skip_auth: bool,
    /// Overrides the configured per-attempt timeout.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            skip_auth: false,
            timeout: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).body(body)
    }

    pub fn put(body: Value) -> Self {
        Self::new(Method::PUT).body(body)
    }

    pub fn patch(body: Value) -> Self {
        Self::new(Method::PATCH).body(body)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Methods that require the CSRF header.
pub fn is_state_changing(method: &Method) -> bool {
    method == Method::POST || method == Method::PUT || method == Method::PATCH || method == Method::DELETE
}

/// Client executing envelope-returning API calls with retries and timeouts.
pub struct ResilientHttpClient<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    api_root: Url,
    policy: RetryPolicy,
    protector: Arc<CsrfProtector>,
    transport: T,
    session: RwLock<Option<CsrfSession>>,
}

impl ResilientHttpClient<ReqwestTransport> {
    /// Client over a default `reqwest` transport.
    pub fn new(config: ClientConfig, protector: Arc<CsrfProtector>) -> Result<Self, ClientError> {
        Self::with_transport(config, protector, ReqwestTransport::new())
    }
}

impl<T: Transport> ResilientHttpClient<T> {
    /// Client over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        protector: Arc<CsrfProtector>,
        transport: T,
    ) -> Result<Self, ClientError> {
        let api_root = api_root(&config)?;
        let policy = RetryPolicy::from_config(&config);

        Ok(Self {
            config,
            api_root,
            policy,
            protector,
            transport,
            session: RwLock::new(None),
        })
    }

    /// Replace the retry policy derived from config.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current CSRF session, if one was established.
    pub fn session(&self) -> Option<CsrfSession> {
        self.session.read().expect("session lock poisoned").clone()
    }

    pub fn set_session(&self, session: CsrfSession) {
        *self.session.write().expect("session lock poisoned") = Some(session);
    }

    /// Forget the session (sign-out).
    pub fn clear_session(&self) {
        *self.session.write().expect("session lock poisoned") = None;
    }

    /// Resolve `endpoint` against `{base_url}/api/{api_version}/`.
    ///
    /// The result must stay on the configured origin and below the API root,
    /// since state-changing requests carry the CSRF pair.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ClientError> {
        let url = self
            .api_root
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidRequest(format!("bad endpoint '{}': {}", endpoint, e)))?;

        if url.origin() != self.api_root.origin() || !url.path().starts_with(self.api_root.path()) {
            return Err(ClientError::InvalidRequest(format!(
                "endpoint '{}' resolves outside {}",
                endpoint, self.api_root
            )));
        }
        Ok(url)
    }

    /// Fetch a token pair from the server and keep it for later state-changing calls.
    pub async fn establish_session(&self) -> Result<CsrfSession, ClientError> {
        let endpoint = self.config.csrf_endpoint.clone();
        let (response_headers, envelope) = self
            .run::<TokenGrant>(&endpoint, RequestOptions::get().skip_auth())
            .await?;

        let grant = match envelope {
            ResponseEnvelope { success: true, data: Some(grant), .. } => grant,
            ResponseEnvelope { error: Some(e), .. } => {
                return Err(ClientError::Session(format!("{}: {}", e.code, e.message)))
            }
            _ => return Err(ClientError::Session("token endpoint returned no data".to_string())),
        };

        let cookie_name = &self.protector.config().cookie_name;
        let cookie_token = response_headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| find_in_set_cookie(v, cookie_name))
            .ok_or_else(|| ClientError::Session(format!("response did not set the '{}' cookie", cookie_name)))?;

        let session = CsrfSession {
            header_token: grant.header_token,
            cookie_token,
        };
        self.set_session(session.clone());

        tracing::info!(
            service = %self.config.service_name,
            token = %redact(&session.header_token),
            expires_in = grant.expires_in,
            "CSRF session established"
        );
        Ok(session)
    }

    /// Execute one logical request.
    ///
    /// Returns the envelope for both successes and business failures. Fails with
    /// [`ClientError::Network`] once attempts are exhausted, [`ClientError::ContractViolation`]
    /// for malformed responses, and [`ClientError::RateLimited`] on 429.
    pub async fn execute<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ResponseEnvelope<D>, ClientError> {
        self.run(endpoint, options).await.map(|(_, envelope)| envelope)
    }

    pub async fn get<D: DeserializeOwned>(&self, endpoint: &str) -> Result<ResponseEnvelope<D>, ClientError> {
        self.execute(endpoint, RequestOptions::get()).await
    }

    pub async fn post<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<ResponseEnvelope<D>, ClientError> {
        self.execute(endpoint, RequestOptions::post(body)).await
    }

    async fn run<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<(axum::http::HeaderMap, ResponseEnvelope<D>), ClientError> {
        let url = self.endpoint_url(endpoint)?;
        let body = options
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ClientError::InvalidRequest(format!("body not serializable: {}", e)))?;
        let deadline = options
            .timeout
            .unwrap_or(Duration::from_millis(self.config.timeout_ms));
        let attach_csrf = !options.skip_auth && is_state_changing(&options.method);
        let service = self.config.service_name.as_str();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let request = self.build_request(&options.method, &url, body.clone(), attach_csrf);
            let request_id = request
                .headers
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            let started = Instant::now();
            let result = with_deadline(deadline, self.transport.send(request)).await;
            let elapsed = started.elapsed();

            let failure = match result {
                Ok(response) => {
                    let status = response.status;
                    metrics::record_client_attempt(service, &status.to_string(), elapsed);
                    tracing::debug!(
                        service,
                        request_id = %request_id,
                        method = %options.method,
                        url = %url,
                        attempt,
                        status,
                        duration_ms = elapsed.as_millis() as u64,
                        "Attempt completed"
                    );

                    if status == 429 {
                        return Err(rate_limited(&response));
                    }

                    if self.policy.is_retryable(AttemptOutcome::Status(status)) {
                        AttemptFailure::Status { status }
                    } else {
                        let envelope = ResponseEnvelope::decode(status, &response.body).map_err(|v| {
                            tracing::warn!(
                                service,
                                request_id = %request_id,
                                url = %url,
                                status,
                                reason = %v.reason,
                                "Response violates envelope contract"
                            );
                            ClientError::ContractViolation(v)
                        })?;
                        return Ok((response.headers, envelope));
                    }
                }
                Err(e) => {
                    metrics::record_client_attempt(service, e.kind(), elapsed);
                    AttemptFailure::Transport(e)
                }
            };

            if self.policy.should_stop(attempt) {
                tracing::error!(
                    service,
                    request_id = %request_id,
                    method = %options.method,
                    url = %url,
                    attempts = attempt,
                    error = %failure,
                    "Request failed, attempts exhausted"
                );
                return Err(ClientError::Network {
                    attempts: attempt,
                    last: failure,
                });
            }

            let delay = self.policy.sleep_for(attempt);
            tracing::warn!(
                service,
                request_id = %request_id,
                url = %url,
                attempt,
                delay = ?delay,
                error = %failure,
                "Retrying request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn build_request(
        &self,
        method: &Method,
        url: &Url,
        body: Option<Vec<u8>>,
        attach_csrf: bool,
    ) -> TransportRequest {
        let session = if attach_csrf { self.session() } else { None };

        let mut headers = self
            .protector
            .secure_headers(session.as_ref().map(|s| s.header_token.as_str()));

        if let Ok(v) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert(HeaderName::from_static(X_REQUEST_ID), v);
        }

        if let Some(session) = &session {
            let cookie = format!("{}={}", self.protector.config().cookie_name, session.cookie_token);
            if let Ok(v) = HeaderValue::from_str(&cookie) {
                headers.insert(COOKIE, v);
            }
        }

        TransportRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body,
        }
    }
}

fn api_root(config: &ClientConfig) -> Result<Url, ClientError> {
    let mut root = Url::parse(&config.base_url)
        .map_err(|e| ClientError::InvalidRequest(format!("invalid base_url '{}': {}", config.base_url, e)))?;
    let path = format!(
        "{}/api/{}/",
        root.path().trim_end_matches('/'),
        config.api_version.trim_matches('/')
    );
    root.set_path(&path);
    Ok(root)
}

/// Map a 429 to [`ClientError::RateLimited`], preferring the body over `Retry-After`.
fn rate_limited(response: &TransportResponse) -> ClientError {
    if let Ok(body) = serde_json::from_slice::<RateLimitBody>(&response.body) {
        return ClientError::RateLimited {
            retry_after_secs: body.retry_after,
            remaining: body.remaining,
        };
    }

    let retry_after_secs = response
        .headers
        .get(axum::http::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1);

    ClientError::RateLimited {
        retry_after_secs,
        remaining: 0,
    }
}
