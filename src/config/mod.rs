//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)       command line flags
//!     → loader.rs (parse & deserialize)    │
//!     → validation.rs (semantic checks)    │
//!     → ProxyConfig ◀──── overrides ───────┘
//!     → built once at startup, shared read-only with every handler
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ForwardingConfig, ListenerConfig, ProxyConfig, UpstreamConfig, DEFAULT_UPSTREAM_ADDRESS,
};
pub use validation::{validate_config, ValidationError};
