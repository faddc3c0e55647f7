//! Retry decisions.
//!
//! Pure logic, no I/O: the client asks the policy whether an attempt's outcome
//! is worth retrying, whether the attempt budget is spent, and how long to wait.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::resilience::backoff::{calculate_backoff, with_jitter, Backoff};

/// What a single attempt produced, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Abort, timeout, connection or other network-level failure.
    Transport,
    /// An HTTP response with this status.
    Status(u16),
}

/// Retry policy for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    backoff: Backoff,
    retryable_statuses: HashSet<u16>,
    jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl RetryPolicy {
    /// Build from client config. `max_attempts` below 1 is treated as 1.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.retry.base_delay_ms,
            max_delay_ms: config.retry.max_delay_ms,
            backoff: config.retry.backoff,
            retryable_statuses: config.retry.retryable_statuses.iter().copied().collect(),
            jitter_ratio: config.retry.jitter_ratio,
        }
    }

    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay.as_millis() as u64,
            backoff,
            ..Self::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay_ms = max_delay.as_millis() as u64;
        self
    }

    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Transport failures are always retryable; responses only when their
    /// status is in the configured set.
    pub fn is_retryable(&self, outcome: AttemptOutcome) -> bool {
        match outcome {
            AttemptOutcome::Transport => true,
            AttemptOutcome::Status(status) => self.retryable_statuses.contains(&status),
        }
    }

    /// Exact delay after `attempt` attempts (1-based), capped by the max delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(self.backoff, attempt, self.base_delay_ms, self.max_delay_ms)
    }

    /// Delay actually slept: [`delay_for`](Self::delay_for) plus configured jitter,
    /// never above the max delay.
    pub fn sleep_for(&self, attempt: u32) -> Duration {
        with_jitter(self.delay_for(attempt), self.jitter_ratio)
            .min(Duration::from_millis(self.max_delay_ms))
    }

    /// True once `attempt` attempts have used up the budget.
    pub fn should_stop(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
