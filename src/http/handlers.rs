//! Endpoint handlers owned by the guard itself.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use std::time::SystemTime;

use crate::http::request::cookie_is_secure;
use crate::http::response;
use crate::http::server::AppState;
use crate::protocol::headers::X_CSRF_TOKEN;
use crate::protocol::TokenGrant;

/// `GET /api/v1/csrf-token`: issue a pair, set the cookie, return the header token.
pub async fn issue_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let protector = &state.protector;
    let pair = match protector.issue_token_pair() {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "CSRF token issue failed");
            return response::failure(
                StatusCode::SERVICE_UNAVAILABLE,
                "TOKEN_UNAVAILABLE",
                "Could not issue a CSRF token",
            );
        }
    };

    let grant = TokenGrant {
        header_token: pair.header_token.clone(),
        expires_in: protector.config().ttl_secs,
    };
    let mut response = response::ok(StatusCode::OK, grant);

    let secure = cookie_is_secure(&headers, protector.config().secure_cookie);
    protector.write_cookie(response.headers_mut(), &pair.cookie_token, secure);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// `DELETE /api/v1/csrf-token`: sign-out.
///
/// Only a complete, valid pair is invalidated, even when the guard runs in observe mode.
pub async fn invalidate_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let protector = &state.protector;
    let header_token = headers
        .get(X_CSRF_TOKEN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let cookie_token = protector.read_cookie(&headers).unwrap_or_default();

    let invalidated = match protector.check(header_token, &cookie_token, SystemTime::now()) {
        Ok(()) => protector.invalidate(header_token),
        Err(rejection) => {
            tracing::warn!(reason = rejection.as_str(), "Sign-out with an invalid CSRF pair, token kept");
            false
        }
    };

    let mut response = response::ok(StatusCode::OK, json!({ "invalidated": invalidated }));
    let secure = cookie_is_secure(&headers, protector.config().secure_cookie);
    protector.clear_cookie(response.headers_mut(), secure);
    response
}

/// `GET /health`
pub async fn health() -> Response {
    response::ok(
        StatusCode::OK,
        json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    )
}

/// `POST /api/v1/echo`: return the posted JSON inside an envelope.
pub async fn echo(body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => response::ok(StatusCode::OK, value),
        Err(e) => response::failure(
            StatusCode::BAD_REQUEST,
            "INVALID_JSON",
            &format!("Request body is not valid JSON: {}", e),
        ),
    }
}
