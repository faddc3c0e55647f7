//! Server-side CSRF validation middleware.
//!
//! State-changing requests (POST/PUT/PATCH/DELETE) must carry an `X-CSRF-Token`
//! header matching the CSRF cookie of a pair this server issued. Safe methods pass.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::SystemTime;

use crate::client::is_state_changing;
use crate::config::Enforcement;
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::protocol::headers::X_CSRF_TOKEN;

pub const CSRF_FAILED_CODE: &str = "CSRF_VALIDATION_FAILED";

pub async fn csrf_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_state_changing(request.method()) {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get(X_CSRF_TOKEN)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let cookie_token = state.protector.read_cookie(request.headers()).unwrap_or_default();

    let rejection = match state.protector.check(&header_token, &cookie_token, SystemTime::now()) {
        Ok(()) => return next.run(request).await,
        Err(rejection) => rejection,
    };

    let enforcement = state.protector.config().enforcement;
    metrics::record_csrf_rejection(rejection.as_str(), enforcement.as_str());

    match enforcement {
        Enforcement::Enforce => {
            tracing::warn!(
                request_id = %request_id(request.headers()),
                method = %request.method(),
                path = %request.uri().path(),
                reason = rejection.as_str(),
                "CSRF validation failed, request rejected"
            );
            response::failure(StatusCode::FORBIDDEN, CSRF_FAILED_CODE, "CSRF token missing, invalid or expired")
        }
        Enforcement::Observe => {
            tracing::warn!(
                request_id = %request_id(request.headers()),
                method = %request.method(),
                path = %request.uri().path(),
                reason = rejection.as_str(),
                enforcement = "observe",
                "CSRF validation failed, allowing request"
            );
            next.run(request).await
        }
    }
}
