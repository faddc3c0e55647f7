//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → shared via Arc with the server, protector and limiter
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, CookieSecure, CsrfConfig, Enforcement, GuardConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, RetryConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
