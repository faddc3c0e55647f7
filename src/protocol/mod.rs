//! Wire contract shared by the client and the server.
//!
//! # Data Flow
//! ```text
//! Server handler
//!     → envelope.rs (ResponseEnvelope serialized as JSON)
//!     → network
//!     → envelope.rs (decode + contract check on the client)
//!     → caller gets ResponseEnvelope<T> or ContractViolation
//! ```
//!
//! # Design Decisions
//! - One envelope shape for every endpoint: `{ success, data?, error? }`
//! - Shape violations are a distinct error, never a business result
//! - Header and cookie names live here so both sides agree

pub mod envelope;
pub mod headers;
pub mod payloads;

pub use envelope::{ApiError, ContractViolation, ResponseEnvelope};
pub use payloads::{RateLimitBody, TokenGrant};
