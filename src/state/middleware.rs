//! # Lifecycle State Middleware
//!
//! The reference middleware: listens to lifecycle hooks and writes state
//! snapshots into a [`StateStore`]. Configured with a TTL; a missing or
//! non-positive TTL turns the middleware into a no-op so tracking can be
//! disabled without unregistering it.

use crate::broker::Broker;
use crate::message::{Message, GROUP_INFO};
use crate::middleware::{BeforeProcessFlow, Middleware, ProcessOutcome};
use crate::state::store::StateStore;
use crate::state::{State, StateStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Middleware persisting per-message lifecycle state.
pub struct MessageStateMiddleware {
    store: Arc<dyn StateStore>,
    state_ttl: Option<i64>,
}

impl MessageStateMiddleware {
    /// `state_ttl` is in seconds; `None` or a non-positive value disables
    /// all writes.
    pub fn new(store: Arc<dyn StateStore>, state_ttl: Option<i64>) -> Self {
        Self { store, state_ttl }
    }

    fn ttl(&self) -> Option<i64> {
        self.state_ttl.filter(|ttl| *ttl > 0)
    }

    /// Upsert one snapshot. Hooks are observers and must not abort
    /// dispatch, so store failures are logged, not propagated.
    async fn save(&self, state: State) {
        let Some(ttl) = self.ttl() else {
            return;
        };
        let message_id = state.message_id.clone();
        if let Err(error) = self.store.set_state(state, ttl).await {
            warn!(%message_id, %error, "failed to persist message state");
        }
    }
}

#[async_trait]
impl Middleware for MessageStateMiddleware {
    async fn after_enqueue(&self, broker: &Broker, message: &Message, _delay: Option<Duration>) {
        let priority = broker
            .get_actor(&message.actor_name)
            .map(|actor| actor.priority)
            .ok();
        let group_id = self
            .get_option(GROUP_INFO, broker, message)
            .and_then(|info| {
                info.get("group_id")
                    .and_then(|id| id.as_str().map(str::to_string))
            });
        self.save(
            State::snapshot(message, StateStatus::Pending)
                .with_enqueued_datetime(Utc::now())
                .with_priority(priority)
                .with_group_id(group_id),
        )
        .await;
    }

    async fn before_process_message(&self, _broker: &Broker, message: &Message) -> BeforeProcessFlow {
        self.save(
            State::snapshot(message, StateStatus::Started).with_started_datetime(Utc::now()),
        )
        .await;
        BeforeProcessFlow::Continue
    }

    async fn after_process_message(
        &self,
        _broker: &Broker,
        message: &Message,
        outcome: &ProcessOutcome,
    ) {
        let status = if outcome.is_success() {
            StateStatus::Success
        } else {
            StateStatus::Failure
        };
        self.save(State::snapshot(message, status).with_end_datetime(Utc::now()))
            .await;
    }

    async fn after_skip_message(&self, _broker: &Broker, message: &Message) {
        self.save(State::snapshot(message, StateStatus::Skipped)).await;
    }

    async fn after_message_canceled(&self, _broker: &Broker, message: &Message) {
        self.save(State::snapshot(message, StateStatus::Canceled)).await;
    }
}
