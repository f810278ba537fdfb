//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Upstream used when neither the command line nor a config file names one.
///
/// Points at a local development server rather than a public site so that an
/// unconfigured relay never silently forwards traffic off-host.
pub const DEFAULT_UPSTREAM_ADDRESS: &str = "http://localhost:8000/";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// The single origin every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Upstream client and streaming behavior.
    pub forwarding: ForwardingConfig,

    /// Emit request/response traces for every forwarded call.
    pub debug_logging: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (an IP address).
    pub host: String,

    /// TCP port to listen on. Zero asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URL of the upstream. Path, query and fragment are ignored.
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_UPSTREAM_ADDRESS.to_string(),
        }
    }
}

/// Forwarding engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Longest time buffered response bytes are held before being flushed to
    /// the client. Zero flushes after every chunk.
    pub flush_interval_ms: u64,

    /// Buffered response bytes that force a flush before the interval fires.
    pub max_buffer_bytes: usize,

    /// Upstream connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// How long an idle pooled upstream connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections kept to the upstream.
    pub pool_max_idle_per_host: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 10_000,
            max_buffer_bytes: 32 * 1024,
            connect_timeout_secs: 30,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ProxyConfig::default();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.upstream.address, DEFAULT_UPSTREAM_ADDRESS);
        assert_eq!(config.forwarding.flush_interval_ms, 10_000);
        assert!(!config.debug_logging);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            debug_logging = true

            [upstream]
            address = "https://example.org"
            "#,
        )
        .unwrap();

        assert!(config.debug_logging);
        assert_eq!(config.upstream.address, "https://example.org");
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.forwarding.max_buffer_bytes, 32 * 1024);
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        let listener = ListenerConfig {
            host: "::1".into(),
            port: 9000,
        };
        assert_eq!(listener.bind_address(), "[::1]:9000");
    }
}
