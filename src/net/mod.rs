//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind, fatal on failure)
//!     → accepted connections handed to the HTTP server
//!
//! Each forward:
//!     → connection.rs (ForwardGuard held until the body relay ends)
//! ```

pub mod connection;
pub mod listener;

pub use connection::{ForwardGuard, ForwardId, ForwardTracker};
pub use listener::{bind, ListenerError};
