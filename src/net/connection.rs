//! In-flight forward tracking.
//!
//! # Responsibilities
//! - Generate unique forward IDs for correlating log lines
//! - Count forwards from dispatch until their response body relay ends
//! - Let shutdown (and tests) wait for the count to reach zero

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// Relaxed ordering is enough: IDs only need to be unique.
static FORWARD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one forwarded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForwardId(u64);

impl ForwardId {
    pub fn next() -> Self {
        Self(FORWARD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ForwardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fwd-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Inner {
    active: AtomicU64,
    idle: Notify,
}

/// Counts forwards that are still holding upstream resources.
#[derive(Debug, Clone, Default)]
pub struct ForwardTracker {
    inner: Arc<Inner>,
}

impl ForwardTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new forward. The returned guard decrements the count on drop.
    pub fn track(&self) -> ForwardGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ForwardGuard {
            inner: Arc::clone(&self.inner),
            id: ForwardId::next(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Wait until no forward is in flight. Returns false on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.inner.idle.notified();
                if self.active_count() == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

/// Held for the lifetime of one forward, including its body relay.
#[derive(Debug)]
pub struct ForwardGuard {
    inner: Arc<Inner>,
    id: ForwardId,
}

impl ForwardGuard {
    pub fn id(&self) -> ForwardId {
        self.id
    }
}

impl Drop for ForwardGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
        tracing::trace!(forward_id = %self.id, "Forward finished");
    }
}
