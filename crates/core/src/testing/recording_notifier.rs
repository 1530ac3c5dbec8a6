//! Notifier that records events for test assertions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{Notifier, StackEvent};

/// Records every event it is notified of, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<RwLock<Vec<StackEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events.
    pub async fn events(&self) -> Vec<StackEvent> {
        self.events.read().await.clone()
    }

    /// Number of times `event` was recorded.
    pub async fn count(&self, event: StackEvent) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| **e == event)
            .count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: StackEvent) {
        self.events.write().await.push(event);
    }
}
