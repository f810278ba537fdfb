//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. The upstream is resolved before
//! the listening socket is opened, so a bad address never binds the port.

use tokio::net::TcpListener;

use crate::config::validation::describe;
use crate::config::{validate_config, ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::net::{self, ListenerError};
use crate::upstream::{self, ParseError};

/// Error that aborts startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", describe(.0))]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Upstream(#[from] ParseError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// A bound listener and the server that will accept on it.
pub struct Startup {
    pub listener: TcpListener,
    pub server: HttpServer,
}

/// Validate, resolve the upstream, bind, and build the server, in that order.
pub async fn start(config: ProxyConfig) -> Result<Startup, StartupError> {
    validate_config(&config).map_err(StartupError::Config)?;

    let origin = upstream::normalize(&config.upstream.address)?;
    let listener = net::bind(&config.listener).await?;

    tracing::info!(
        debug_logging = config.debug_logging,
        flush_interval_ms = config.forwarding.flush_interval_ms,
        "Configuration loaded"
    );

    let server = HttpServer::new(&config, origin);
    Ok(Startup { listener, server })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config(address: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;
        config.upstream.address = address.into();
        config
    }

    #[tokio::test]
    async fn starts_with_valid_config() {
        let started = start(local_config("http://127.0.0.1:9/path")).await.unwrap();
        assert_eq!(started.server.origin().as_str(), "http://127.0.0.1:9/");
        assert_ne!(started.listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_first() {
        let mut config = local_config("not a url");
        config.forwarding.max_buffer_bytes = 0;
        assert!(matches!(start(config).await, Err(StartupError::Config(_))));
    }

    #[tokio::test]
    async fn bad_upstream_is_upstream_error() {
        assert!(matches!(
            start(local_config("not a url")).await,
            Err(StartupError::Upstream(_))
        ));
    }
}
