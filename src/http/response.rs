//! Envelope responses.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::protocol::{RateLimitBody, ResponseEnvelope};
use crate::security::RateLimitDecision;

/// `{success: true, data}` with the given status.
pub fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ResponseEnvelope::ok(data))).into_response()
}

/// `{success: false, error: {code, message}}` with the given status.
pub fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ResponseEnvelope::<()>::failure(code, message))).into_response()
}

/// 429 with `Retry-After` and a body carrying `retryAfter` and `remaining`.
pub fn rate_limited(decision: &RateLimitDecision) -> Response {
    let retry_after = decision.retry_after.as_secs_f64().ceil().max(1.0) as u64;
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(RateLimitBody::new(retry_after, decision.remaining)),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limited_rounds_up() {
        let response = rate_limited(&RateLimitDecision {
            allowed: false,
            remaining: 0,
            retry_after: Duration::from_millis(1200),
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "2");
    }

    #[test]
    fn test_failure_status() {
        let response = failure(StatusCode::FORBIDDEN, "CSRF_VALIDATION_FAILED", "nope");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
