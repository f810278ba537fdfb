//! Forwarding engine.
//!
//! # Responsibilities
//! - Rewrite each request to the upstream origin (trace first in debug mode)
//! - Strip hop-by-hop headers in both directions
//! - Dispatch over a pooled client (http and https upstreams)
//! - Observe the response head, then relay the body with periodic flushing
//!
//! # Design Decisions
//! - No retries and no request timeout; connect timeout and pool idle
//!   timeout are the only deadlines
//! - A failed connection is never returned to the pool, so one request's
//!   failure cannot poison another's

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::{ForwardingConfig, ProxyConfig};
use crate::http::relay::{relay, FlushPolicy};
use crate::http::{headers, observe, rewrite};
use crate::net::ForwardTracker;
use crate::upstream::UpstreamOrigin;

/// Pooled client used for every upstream call.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Error for a forward that failed before any response bytes were sent.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to rewrite request target: {0}")]
    Rewrite(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Build the upstream client from forwarding settings.
pub fn build_client(config: &ForwardingConfig) -> UpstreamClient {
    // Err means a provider is already installed, which is all we need.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_nodelay(true);
    http.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(https)
}

/// Forwards requests to the single upstream origin.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    origin: Arc<UpstreamOrigin>,
    debug: bool,
    flush: FlushPolicy,
    max_buffer: usize,
    tracker: ForwardTracker,
}

impl Forwarder {
    pub fn new(config: &ProxyConfig, origin: UpstreamOrigin) -> Self {
        Self {
            client: build_client(&config.forwarding),
            origin: Arc::new(origin),
            debug: config.debug_logging,
            flush: FlushPolicy::from_interval(Duration::from_millis(
                config.forwarding.flush_interval_ms,
            )),
            max_buffer: config.forwarding.max_buffer_bytes,
            tracker: ForwardTracker::new(),
        }
    }

    pub fn origin(&self) -> &UpstreamOrigin {
        &self.origin
    }

    pub fn tracker(&self) -> &ForwardTracker {
        &self.tracker
    }

    /// Forward one request and return the streaming upstream response.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>, ForwardError> {
        let guard = self.tracker.track();
        let (mut parts, body) = request.into_parts();

        if self.debug {
            rewrite::trace_request(&parts);
        }
        rewrite::rewrite(&mut parts, &self.origin)?;
        headers::strip_request_hop_by_hop(&mut parts.headers);

        tracing::debug!(
            forward_id = %guard.id(),
            method = %parts.method,
            uri = %parts.uri,
            "Forwarding request"
        );

        let response = self.client.request(Request::from_parts(parts, body)).await?;

        observe::observe(&response, self.debug);

        let (mut parts, body) = response.into_parts();
        let policy = FlushPolicy::for_response(&parts.headers, self.flush);
        headers::strip_hop_by_hop(&mut parts.headers);

        tracing::debug!(
            forward_id = %guard.id(),
            status = parts.status.as_u16(),
            flush = ?policy,
            "Upstream responded"
        );

        Ok(Response::from_parts(
            parts,
            relay(body, policy, self.max_buffer, guard),
        ))
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("origin", &self.origin.as_str())
            .field("debug", &self.debug)
            .field("flush", &self.flush)
            .field("max_buffer", &self.max_buffer)
            .finish_non_exhaustive()
    }
}
