//! Upstream target subsystem.
//!
//! # Data Flow
//! ```text
//! upstream address (CLI / config file)
//!     → origin.rs (parse, drop path/query/fragment, warn)
//!     → UpstreamOrigin (immutable, scheme + host only)
//!     → shared via Arc with every request handler
//! ```
//!
//! # Design Decisions
//! - Malformed extras are dropped, not rejected; only an unusable address fails
//! - A failed parse aborts startup; there is no fallback origin

pub mod origin;

pub use origin::{normalize, ParseError, UpstreamOrigin};
