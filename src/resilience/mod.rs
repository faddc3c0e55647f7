//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! One attempt of a client request:
//!     → timeouts.rs (deadline; elapsed future is dropped = cancelled)
//!     → On failure: retries.rs (retryable? budget spent?)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every transport call has a deadline
//! - Transport failures always retryable; statuses only from the configured set
//! - Business failures (well-formed `success: false`) are never retried
//! - Delays are capped so high attempt counts stay bounded

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::Backoff;
pub use retries::{AttemptOutcome, RetryPolicy};
