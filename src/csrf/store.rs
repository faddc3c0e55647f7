//! Token storage.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::csrf::token::TokenPair;

/// Registry of issued pairs keyed by header token.
///
/// Implementations must be safe to share between request tasks.
pub trait TokenStore: Send + Sync {
    /// Insert a pair. An existing entry under the same key is replaced.
    fn put(&self, pair: TokenPair);

    /// Look up a pair by header token.
    fn get(&self, header_token: &str) -> Option<TokenPair>;

    /// Remove a pair, returning it if it was present.
    fn delete(&self, header_token: &str) -> Option<TokenPair>;

    /// Remove every pair with `now - issued_at > ttl`. Returns how many were removed.
    fn sweep_expired(&self, now: SystemTime, ttl: Duration) -> usize;

    /// Number of stored pairs, expired ones included until swept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store backed by a concurrent map.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    inner: Arc<DashMap<String, TokenPair>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn put(&self, pair: TokenPair) {
        self.inner.insert(pair.header_token.clone(), pair);
    }

    fn get(&self, header_token: &str) -> Option<TokenPair> {
        self.inner.get(header_token).map(|r| r.value().clone())
    }

    fn delete(&self, header_token: &str) -> Option<TokenPair> {
        self.inner.remove(header_token).map(|(_, pair)| pair)
    }

    fn sweep_expired(&self, now: SystemTime, ttl: Duration) -> usize {
        let mut removed = 0;
        self.inner.retain(|_, pair| {
            let keep = !pair.is_expired(now, ttl);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
