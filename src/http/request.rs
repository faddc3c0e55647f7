//! Request inspection helpers.

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use std::net::SocketAddr;

use crate::config::CookieSecure;
use crate::protocol::headers::X_REQUEST_ID;

/// The request's `X-Request-ID`, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Rate-limit identity: the configured identity header when present, else the peer IP.
pub fn client_identity(request: &Request<Body>, identity_header: Option<&str>) -> String {
    if let Some(name) = identity_header {
        if let Some(value) = request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            return format!("id:{}", value.trim());
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

/// Whether the CSRF cookie should carry `Secure` for this request.
pub fn cookie_is_secure(headers: &HeaderMap, policy: CookieSecure) -> bool {
    match policy {
        CookieSecure::Always => true,
        CookieSecure::Never => false,
        CookieSecure::Auto => headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or("").trim().eq_ignore_ascii_case("https"))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_prefers_header() {
        let mut request = Request::builder()
            .header("x-user-id", "user-42")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("10.1.2.3:5555".parse::<SocketAddr>().unwrap()));

        assert_eq!(client_identity(&request, Some("x-user-id")), "id:user-42");
        assert_eq!(client_identity(&request, None), "ip:10.1.2.3");
        assert_eq!(client_identity(&request, Some("x-other")), "ip:10.1.2.3");
    }

    #[test]
    fn test_identity_without_peer() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identity(&request, None), "ip:unknown");
    }

    #[test]
    fn test_cookie_secure_policy() {
        let mut headers = HeaderMap::new();
        assert!(!cookie_is_secure(&headers, CookieSecure::Auto));
        assert!(cookie_is_secure(&headers, CookieSecure::Always));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS, http"));
        assert!(cookie_is_secure(&headers, CookieSecure::Auto));
        assert!(!cookie_is_secure(&headers, CookieSecure::Never));
    }
}
