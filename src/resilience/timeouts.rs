//! Timeout enforcement.
//!
//! The in-flight future is dropped when the deadline passes, which cancels the
//! transport call and releases its connection.

use std::future::Future;
use std::time::Duration;

use crate::client::error::TransportError;

/// Run `fut` with a deadline. Elapsed deadlines become [`TransportError::Timeout`].
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline)),
    }
}
