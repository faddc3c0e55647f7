//! HTTP surface of the guard.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, tracing, timeout, body limit, metrics)
//!     → security::csrf_guard (double-submit check on state-changing methods)
//!     → security::rate_limit (fixed window per identity)
//!     → handlers.rs / application routes
//!     → response.rs (envelope, security headers)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, TOKEN_PATH};
