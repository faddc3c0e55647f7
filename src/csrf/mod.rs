//! Double-submit-cookie CSRF protection.
//!
//! # Data Flow
//! ```text
//! Session start:
//!     protector.rs issue_token_pair()
//!     → token.rs (two independent 256-bit OS-random nonces)
//!     → store.rs (keyed by header token, expired entries swept first)
//!     → cookie.rs (Set-Cookie with the cookie half)
//!     → header half returned to the caller
//!
//! Every state-changing request:
//!     X-CSRF-Token header + csrf_token cookie
//!     → protector.rs validate() (lookup, expiry, constant-time compare)
//! ```
//!
//! # Design Decisions
//! - No fallback to a weak generator: issuing fails if the OS RNG fails
//! - Expired pairs never validate, swept or not
//! - Storage sits behind the `TokenStore` trait so a shared backend can replace the map

pub mod cookie;
pub mod protector;
pub mod store;
pub mod token;

pub use protector::{CsrfProtector, CsrfRejection};
pub use store::{InMemoryTokenStore, TokenStore};
pub use token::{CsrfError, TokenPair};
