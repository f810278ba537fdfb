//! Shutdown coordination.
//!
//! Shutdown has two phases: once triggered the server stops accepting, and
//! once the drain deadline passes any response still streaming is abandoned.
//! The signal is level-triggered, so a task that starts listening after the
//! trigger still sees it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

/// How long in-flight responses may keep streaming after the trigger.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Coordinator for graceful shutdown, shared by the server and the signal task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    drain_timeout: Duration,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Replace the drain deadline.
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    /// Trigger the shutdown signal. Repeated calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been triggered.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Resolve once shutdown has been triggered and the drain deadline has passed.
    pub async fn drain_expired(&self) {
        self.triggered().await;
        time::sleep(self.drain_timeout).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
