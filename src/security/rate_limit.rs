//! Fixed-window rate limiting.
//!
//! # States (per identity)
//! ```text
//! Fresh (no entry or window over) → count = 1, window = now + window_ms, allowed
//! Active (count < max)            → count += 1, allowed
//! Exhausted (count >= max)        → refused, count unchanged
//! ```

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::http::request::client_identity;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Time until the window resets.
    pub retry_after: Duration,
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    window_reset_at: Instant,
}

/// Per-identity fixed-window counter. Single-process; entries update atomically per key.
pub struct RateLimiter {
    windows: DashMap<String, WindowEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count a request from `identity` at `now`.
    pub fn check(&self, identity: &str, now: Instant) -> RateLimitDecision {
        let fresh = WindowEntry {
            count: 1,
            window_reset_at: now + self.window,
        };

        if self.max_requests == 0 {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: self.window,
            };
        }

        match self.windows.entry(identity.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                self.allowed(&fresh, now)
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if now > entry.window_reset_at {
                    *entry = fresh;
                    return self.allowed(entry, now);
                }
                if entry.count < self.max_requests {
                    entry.count += 1;
                    return self.allowed(entry, now);
                }
                RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    retry_after: entry.window_reset_at.saturating_duration_since(now),
                }
            }
        }
    }

    fn allowed(&self, entry: &WindowEntry, now: Instant) -> RateLimitDecision {
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests.saturating_sub(entry.count),
            retry_after: entry.window_reset_at.saturating_duration_since(now),
        }
    }

    /// Drop windows that have ended. Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.windows.retain(|_, entry| {
            let keep = now <= entry.window_reset_at;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Identities with a live or unpruned window.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

/// Middleware rejecting requests over the per-identity limit with 429.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limit.enabled {
        return next.run(request).await;
    }

    let identity = client_identity(&request, state.config.rate_limit.identity_header.as_deref());
    let decision = state.limiter.check(&identity, Instant::now());

    if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %identity,
            retry_after_secs = decision.retry_after.as_secs(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited("fixed_window");
        response::rate_limited(&decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_lifecycle() {
        let limiter = RateLimiter::new(3, Duration::from_millis(1000));
        let t0 = Instant::now();

        let remaining: Vec<_> = (0..3)
            .map(|i| limiter.check("alice", t0 + Duration::from_millis(i * 10)))
            .inspect(|d| assert!(d.allowed))
            .map(|d| d.remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);

        let fourth = limiter.check("alice", t0 + Duration::from_millis(500));
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
        assert_eq!(fourth.retry_after, Duration::from_millis(500));

        let after = limiter.check("alice", t0 + Duration::from_millis(1001));
        assert!(after.allowed);
        assert_eq!(after.remaining, 2);
    }

    #[test]
    fn test_exhausted_does_not_extend_count() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(limiter.check("bob", t0).allowed);
        for i in 1..10 {
            assert!(!limiter.check("bob", t0 + Duration::from_secs(i)).allowed);
        }
        // window boundary is inclusive: still refused exactly at reset time
        assert!(!limiter.check("bob", t0 + Duration::from_secs(60)).allowed);
        assert!(limiter.check("bob", t0 + Duration::from_secs(61)).allowed);
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check("10.0.0.1", now).allowed);
        assert!(!limiter.check("10.0.0.1", now).allowed);
        assert!(limiter.check("10.0.0.2", now).allowed);
    }

    #[test]
    fn test_prune_removes_finished_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        let t0 = Instant::now();
        limiter.check("a", t0);
        limiter.check("b", t0 + Duration::from_millis(900));
        assert_eq!(limiter.prune(t0 + Duration::from_millis(1500)), 1);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_concurrent_checks_never_exceed_limit() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(60)));
        let now = Instant::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..20).filter(|_| limiter.check("shared", now).allowed).count())
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }
}
