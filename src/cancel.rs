//! # Cancellation Backend
//!
//! Cancellation is cooperative and external: cancelling a message id only
//! marks intent here. The processing path observes that intent before
//! running the job and emits `after_message_canceled`; nothing preempts a
//! job that is already running.

use async_trait::async_trait;
use dashmap::DashSet;

/// Stores cancellation intent, keyed by message id.
#[async_trait]
pub trait CancelBackend: Send + Sync {
    /// Mark the given message ids as canceled. Best-effort, advisory.
    async fn cancel(&self, message_ids: &[String]);

    /// Whether cancellation intent has been recorded for the id.
    async fn is_canceled(&self, message_id: &str) -> bool;
}

/// Process-local cancel backend.
#[derive(Debug, Default)]
pub struct InMemoryCancelBackend {
    canceled: DashSet<String>,
}

impl InMemoryCancelBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CancelBackend for InMemoryCancelBackend {
    async fn cancel(&self, message_ids: &[String]) {
        for message_id in message_ids {
            self.canceled.insert(message_id.clone());
        }
    }

    async fn is_canceled(&self, message_id: &str) -> bool {
        self.canceled.contains(message_id)
    }
}
