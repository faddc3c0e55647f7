//! Backoff delay calculation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay growth shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base * attempt`
    Linear,
    /// `base * 2^(attempt - 1)`
    #[default]
    Exponential,
}

/// Delay to wait after `attempt` attempts have been made (1-based), capped at `max_ms`.
pub fn calculate_backoff(backoff: Backoff, attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let delay_ms = match backoff {
        Backoff::Linear => base_ms.saturating_mul(attempt as u64),
        Backoff::Exponential => {
            let factor = 2u64.saturating_pow(attempt - 1);
            base_ms.saturating_mul(factor)
        }
    };

    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add up to `ratio * delay` of random jitter.
pub fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    if ratio <= 0.0 {
        return delay;
    }

    let jitter_range = (delay.as_millis() as f64 * ratio) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    delay + Duration::from_millis(jitter)
}
