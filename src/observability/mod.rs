//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (subscriber setup, stderr, env filter)
//!     → trace.rs (per-request/response header traces, debug mode only)
//! ```
//!
//! # Design Decisions
//! - Structured fields on operational events, plain lines for traces
//! - Logging can never fail a forward

pub mod logging;
pub mod trace;
