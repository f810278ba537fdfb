//! Single-origin HTTP reverse proxy library.
//!
//! Every request accepted on the local port is forwarded, path and query
//! intact, to one fixed upstream origin; the upstream's response streams back
//! with bounded-latency flushing.

// Core pipeline
pub mod http;
pub mod upstream;

// Plumbing
pub mod cli;
pub mod config;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use upstream::UpstreamOrigin;
