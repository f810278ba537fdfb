//! Response body relay with periodic flushing.
//!
//! Each response gets its own relay task. Upstream frames are collected in a
//! buffer and pushed to the client when the flush tick fires, when the buffer
//! fills, before trailers, and at end of stream. The tick lives inside the
//! task, so it goes away with the response.
//!
//! ```text
//! upstream body ──frame()──▶ BytesMut ──(tick | full | eos)──▶ channel ──▶ client body
//!                                ▲
//!                        interval (per response)
//! ```

use std::pin::Pin;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap};
use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Body as HttpBody, Frame};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::net::ForwardGuard;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Frames in flight between the relay task and the client connection.
const RELAY_CHANNEL_DEPTH: usize = 8;

type RelayItem = Result<Frame<Bytes>, RelayError>;

/// Error surfaced to the client connection when upstream fails mid-body.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("upstream body failed mid-stream: {0}")]
    Upstream(#[source] BoxError),
}

/// When buffered response bytes are pushed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Every chunk goes out as soon as it arrives.
    Immediate,
    /// Bytes are held at most this long.
    Every(Duration),
}

impl FlushPolicy {
    /// Policy for a configured interval; zero means `Immediate`.
    pub fn from_interval(interval: Duration) -> Self {
        if interval.is_zero() {
            Self::Immediate
        } else {
            Self::Every(interval)
        }
    }

    /// Event streams and responses of unknown length are never held back.
    pub fn for_response(headers: &HeaderMap, configured: FlushPolicy) -> Self {
        if is_event_stream(headers) || !headers.contains_key(header::CONTENT_LENGTH) {
            Self::Immediate
        } else {
            configured
        }
    }
}

fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case("text/event-stream"))
        .unwrap_or(false)
}

/// Relay `upstream` to the client as a streaming body.
///
/// The guard is held until the relay ends, whether by end of stream, upstream
/// error, or the client going away.
pub fn relay<B>(upstream: B, policy: FlushPolicy, max_buffer: usize, guard: ForwardGuard) -> Body
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + Send,
{
    let (tx, mut rx) = mpsc::channel::<RelayItem>(RELAY_CHANNEL_DEPTH);
    tokio::spawn(pump(Box::pin(upstream), tx, policy, max_buffer, guard));

    let frames = futures_util::stream::poll_fn(move |cx| rx.poll_recv(cx));
    Body::new(StreamBody::new(frames))
}

async fn pump<B>(
    mut upstream: Pin<Box<B>>,
    tx: mpsc::Sender<RelayItem>,
    policy: FlushPolicy,
    max_buffer: usize,
    guard: ForwardGuard,
) where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError> + Send,
{
    let mut buffer = BytesMut::new();
    let mut ticker = match policy {
        FlushPolicy::Immediate => None,
        FlushPolicy::Every(period) => {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        }
    };

    loop {
        tokio::select! {
            frame = upstream.frame() => match frame {
                Some(Ok(frame)) => {
                    let frame = match frame.into_data() {
                        Ok(data) if ticker.is_none() => {
                            if !send(&tx, Frame::data(data)).await {
                                return;
                            }
                            continue;
                        }
                        Ok(data) => {
                            buffer.extend_from_slice(&data);
                            if buffer.len() >= max_buffer && !flush(&tx, &mut buffer).await {
                                return;
                            }
                            continue;
                        }
                        Err(frame) => frame,
                    };
                    // Trailers go out after everything buffered.
                    if !flush(&tx, &mut buffer).await || !send(&tx, frame).await {
                        return;
                    }
                }
                Some(Err(err)) => {
                    let err: BoxError = err.into();
                    tracing::error!(forward_id = %guard.id(), error = %err, "proxy error: upstream body failed");
                    if flush(&tx, &mut buffer).await {
                        let _ = tx.send(Err(RelayError::Upstream(err))).await;
                    }
                    return;
                }
                None => {
                    flush(&tx, &mut buffer).await;
                    tracing::trace!(forward_id = %guard.id(), "Response body complete");
                    return;
                }
            },
            _ = next_tick(&mut ticker) => {
                if !flush(&tx, &mut buffer).await {
                    return;
                }
            }
            _ = tx.closed() => {
                tracing::debug!(forward_id = %guard.id(), "Client went away, abandoning upstream response");
                return;
            }
        }
    }
}

/// Push buffered bytes. Returns false once the client is gone.
async fn flush(tx: &mpsc::Sender<RelayItem>, buffer: &mut BytesMut) -> bool {
    if buffer.is_empty() {
        return true;
    }
    send(tx, Frame::data(buffer.split().freeze())).await
}

async fn send(tx: &mpsc::Sender<RelayItem>, frame: Frame<Bytes>) -> bool {
    tx.send(Ok(frame)).await.is_ok()
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
