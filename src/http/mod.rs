//! HTTP forwarding pipeline.
//!
//! # Data Flow
//! ```text
//! client connection
//!     → server.rs (Axum, any method, any path)
//!     → forward.rs
//!         → rewrite.rs (trace as received, then retarget to upstream origin)
//!         → headers.rs (drop hop-by-hop headers)
//!         → pooled upstream client
//!         → observe.rs (trace status + headers, read-only)
//!         → headers.rs (drop hop-by-hop headers)
//!         → relay.rs (buffered body relay, periodic flush)
//!     → client connection
//! ```

pub mod forward;
pub mod headers;
pub mod observe;
pub mod relay;
pub mod rewrite;
pub mod server;

pub use forward::{ForwardError, Forwarder};
pub use relay::FlushPolicy;
pub use server::HttpServer;
