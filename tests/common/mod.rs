//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::Request, Router};
use origin_relay::config::ProxyConfig;
use origin_relay::lifecycle::{self, Shutdown};
use origin_relay::net::ForwardTracker;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A relay running in the background against some upstream.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub tracker: ForwardTracker,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a relay on an ephemeral port in front of `upstream`.
pub async fn spawn_proxy(upstream: &str, configure: impl FnOnce(&mut ProxyConfig)) -> TestProxy {
    spawn_proxy_with(upstream, Shutdown::new(), configure).await
}

/// Like `spawn_proxy`, with a caller-supplied shutdown coordinator.
pub async fn spawn_proxy_with(
    upstream: &str,
    shutdown: Shutdown,
    configure: impl FnOnce(&mut ProxyConfig),
) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstream.address = upstream.to_string();
    configure(&mut config);

    let started = lifecycle::start(config).await.unwrap();
    let addr = started.listener.local_addr().unwrap();
    let tracker = started.server.tracker();
    let server_shutdown = shutdown.clone();

    let handle =
        tokio::spawn(async move { started.server.run(started.listener, server_shutdown).await });

    TestProxy {
        addr,
        shutdown,
        tracker,
        handle,
    }
}

/// A client that never reuses connections and ignores proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// A port nothing is listening on.
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Consume the request head so the client is not reset mid-write.
async fn read_head(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a raw TCP backend; `f` writes whatever it wants to each connection.
pub async fn start_raw_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_head(&mut socket).await;
                        f(socket).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that returns a fixed raw HTTP response.
pub async fn start_fixed_backend(response: &'static str) -> SocketAddr {
    start_raw_backend(move |mut socket| async move {
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    })
    .await
}

/// Start an Axum backend that describes each request it receives, one item
/// per line: `METHOD URI`, host header, leaked hop-by-hop header names, body.
pub async fn start_echo_backend() -> SocketAddr {
    start_axum_backend(Router::new().fallback(echo)).await
}

async fn echo(request: Request) -> String {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let host = parts
        .headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let hops: Vec<&str> = ["x-hop", "keep-alive", "proxy-authorization"]
        .into_iter()
        .filter(|name| parts.headers.contains_key(*name))
        .collect();
    format!(
        "{} {}\n{}\n{}\n{}",
        parts.method,
        parts.uri,
        host,
        hops.join(","),
        String::from_utf8_lossy(&body)
    )
}

/// Serve an Axum router on an ephemeral port.
pub async fn start_axum_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Log output captured in memory, without timestamps, levels or targets.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// A subscriber writing events matching `filter` into this buffer.
    pub fn subscriber(&self, filter: &str) -> impl tracing::Subscriber + Send + Sync {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_level(false)
            .with_target(false)
            .without_time()
            .finish()
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| line.trim().to_string())
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
