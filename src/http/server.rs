//! HTTP server setup.
//!
//! # Responsibilities
//! - Create an Axum Router that sends every method and path to the forwarder
//! - Wire up request tracing middleware
//! - Serve connections concurrently until the shutdown signal fires
//! - Turn pre-response forward failures into 502 Bad Gateway

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::http::forward::Forwarder;
use crate::lifecycle::Shutdown;
use crate::net::ForwardTracker;
use crate::upstream::UpstreamOrigin;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    forwarder: Forwarder,
}

impl HttpServer {
    /// Create a server forwarding everything to `origin`.
    pub fn new(config: &ProxyConfig, origin: UpstreamOrigin) -> Self {
        let forwarder = Forwarder::new(config, origin);
        let state = AppState {
            forwarder: forwarder.clone(),
        };

        Self {
            router: Self::build_router(state),
            forwarder,
        }
    }

    /// Build the Axum router. There is no routing table: every path forwards.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// In-flight forward counter, shared with the handlers.
    pub fn tracker(&self) -> ForwardTracker {
        self.forwarder.tracker().clone()
    }

    pub fn origin(&self) -> &UpstreamOrigin {
        self.forwarder.origin()
    }

    /// Run the server until shutdown is triggered.
    ///
    /// Once triggered, no new connections are accepted. Open responses may
    /// finish until the drain deadline, after which they are abandoned.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.forwarder.origin(),
            "HTTP server starting"
        );

        let tracker = self.tracker();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let signal = shutdown.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.triggered().await;
                tracing::info!("Shutdown signal received");
            })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = shutdown.drain_expired() => {
                tracing::warn!(
                    in_flight = tracker.active_count(),
                    drain_timeout = ?shutdown.drain_timeout(),
                    "Drain deadline passed, abandoning unfinished responses"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward the request; a failure before any response byte becomes a 502.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match state.forwarder.forward(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                client = %client,
                method = %method,
                uri = %uri,
                error = %e,
                "proxy error"
            );
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
