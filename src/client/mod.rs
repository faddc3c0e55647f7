//! Resilient API client.
//!
//! # Data Flow
//! ```text
//! caller: execute(endpoint, options)
//!     → resilient.rs (secure headers from CsrfProtector, X-Request-ID per attempt)
//!     → resilience::timeouts (per-attempt deadline)
//!     → transport.rs (reqwest, or any Transport impl)
//!     → protocol::envelope (decode + contract check)
//!     → resilience::retries (retry transport failures / retryable statuses)
//!     → ResponseEnvelope<T> | ClientError
//! ```
//!
//! # Design Decisions
//! - Business failures are returned, not thrown
//! - Contract violations and 429s are never retried
//! - Retries of one logical request are strictly sequential
//! - The transport is a trait so tests and other stacks can plug in

pub mod error;
pub mod resilient;
pub mod transport;

pub use error::{AttemptFailure, ClientError, TransportError};
pub use resilient::{is_state_changing, CsrfSession, RequestOptions, ResilientHttpClient};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
