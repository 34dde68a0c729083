//! Best-effort event delivery
//!
//! The caller may disconnect at any time. Once the receiving end is gone,
//! emitting becomes a no-op so the session can still run to its end.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use super::types::StreamEvent;

/// Outbound event channel that swallows write failures
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    closed: AtomicBool,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a sink and the receiver it feeds
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Deliver an event, waiting for channel capacity
    pub async fn emit(&self, event: StreamEvent) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        if self.tx.send(event).await.is_err() {
            self.closed.store(true, Ordering::Relaxed);
            debug!("Event receiver dropped; discarding further events");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed) || self.tx.is_closed()
    }
}
