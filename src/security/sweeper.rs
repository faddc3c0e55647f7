//! Periodic cleanup of expired CSRF pairs and finished rate-limit windows.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;
use tokio::time;

use crate::csrf::CsrfProtector;
use crate::security::rate_limit::RateLimiter;

pub struct Sweeper {
    protector: Arc<CsrfProtector>,
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(protector: Arc<CsrfProtector>, limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self {
            protector,
            limiter,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Run one sweep. Returns (tokens removed, windows removed).
    pub fn sweep_once(&self) -> (usize, usize) {
        let tokens = self.protector.sweep(SystemTime::now());
        let windows = self.limiter.prune(Instant::now());
        if tokens > 0 || windows > 0 {
            tracing::debug!(tokens, windows, "Sweeper removed expired entries");
        }
        (tokens, windows)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Sweeper starting");

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CsrfConfig;

    #[tokio::test]
    async fn test_sweep_once_and_shutdown() {
        let mut config = CsrfConfig::default();
        config.ttl_secs = 1;
        let protector = Arc::new(CsrfProtector::new(config));
        let limiter = Arc::new(RateLimiter::new(5, Duration::from_millis(1)));

        protector.issue_token_pair().unwrap();
        protector
            .issue_token_pair_at(SystemTime::now() - Duration::from_secs(10))
            .unwrap();
        limiter.check("a", Instant::now() - Duration::from_secs(1));

        let sweeper = Sweeper::new(protector.clone(), limiter.clone(), Duration::from_secs(1));
        assert_eq!(sweeper.sweep_once(), (1, 1));
        assert_eq!(protector.active_tokens(), 1);

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(sweeper.run(rx));
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
