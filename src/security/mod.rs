//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → csrf_guard.rs (double-submit check on state-changing methods)
//!     → rate_limit.rs (fixed-window count per identity)
//!     → business handler
//!     → headers.rs (hardening response headers)
//!
//! Background:
//!     sweeper.rs (expired tokens, finished windows)
//! ```
//!
//! # Design Decisions
//! - CSRF runs before the limiter and business logic
//! - Enforcement mode is explicit config: `enforce` rejects, `observe` logs
//! - In-memory state is per process; a shared store plugs in behind `TokenStore`

pub mod csrf_guard;
pub mod headers;
pub mod rate_limit;
pub mod sweeper;

pub use rate_limit::{RateLimitDecision, RateLimiter};
