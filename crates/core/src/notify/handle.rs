use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::StackEvent;

/// Receives orchestration events.
///
/// Delivery failures are the notifier's problem: `notify` never fails the
/// orchestration.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: StackEvent);
}

/// Envelope wrapping an event with delivery metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub timestamp: DateTime<Utc>,
    pub event: StackEvent,
    pub message: &'static str,
}

impl Notification {
    pub fn new(event: StackEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            message: event.message(),
        }
    }
}

/// Notifier forwarding events over an mpsc channel.
///
/// This is cheaply cloneable and can be shared across tasks.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiving end of its channel.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: StackEvent) {
        if let Err(e) = self.tx.send(Notification::new(event)).await {
            tracing::error!("Failed to deliver notification: {}", e);
        }
    }
}

/// Notifier writing events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: StackEvent) {
        if event.is_error() {
            warn!(event = event.as_str(), "{}", event.message());
        } else {
            info!(event = event.as_str(), "{}", event.message());
        }
    }
}
