//! # Middleware Contract
//!
//! The fixed catalog of lifecycle hooks every job passes through, plus the
//! option-resolution cascade middleware use to read tunables. Every hook
//! defaults to a no-op so implementations pick whatever subset they need.
//!
//! Hooks are observers: they cannot abort dispatch. The single exception is
//! [`Middleware::before_process_message`], whose returned
//! [`BeforeProcessFlow::Skip`] redirects the attempt from "processed" to
//! "skipped". The skip signal is an explicit variant rather than an error
//! so the dispatcher's branch lives in ordinary control flow.

use crate::actor::{Actor, ActorError};
use crate::broker::Broker;
use crate::message::{GroupInfo, Message, OptionsMap, GROUP_INFO, PIPE_TARGET};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Control-flow result of `before_process_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeProcessFlow {
    /// Keep dispatching; run the actor body.
    Continue,
    /// Stop dispatching before hooks, skip the actor body, and emit
    /// `after_skip_message` on every registered middleware.
    Skip,
}

/// Terminal outcome of one execution attempt, as seen by
/// `after_process_message`.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Success(Value),
    Failure(ActorError),
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ActorError> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Success(_) => None,
        }
    }
}

/// A pluggable observer/transformer of the message lifecycle.
///
/// Implementations are registered with the broker at startup in a fixed
/// order that is preserved for the lifetime of the process. Before and
/// after hooks both fire in registration order; the order is never
/// reversed for the after side.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Option names this middleware is willing to resolve at the actor
    /// level. Purely descriptive; advertised through the API surface.
    fn actor_options(&self) -> &[&str] {
        &[]
    }

    /// Explicit per-middleware defaults table, keyed by option name. The
    /// final fallback of the resolution cascade.
    fn middleware_option(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Resolve a tunable for `message`: message options first, then the
    /// declared actor's options, then [`Middleware::middleware_option`].
    /// The reserved keys `pipe_target` and `group_info` never resolve past
    /// the message level. Presence-check semantics throughout: a key whose
    /// value is JSON null is absent, any other value is present.
    fn get_option(&self, name: &str, broker: &Broker, message: &Message) -> Option<Value> {
        if let Some(value) = message.option(name) {
            return Some(value.clone());
        }
        if name == PIPE_TARGET || name == GROUP_INFO {
            return None;
        }
        if let Ok(actor) = broker.get_actor(&message.actor_name) {
            if let Some(value) = actor.option(name) {
                return Some(value.clone());
            }
        }
        self.middleware_option(name)
    }

    async fn before_declare_actor(&self, _broker: &Broker, _actor: &Actor) {}
    async fn after_declare_actor(&self, _broker: &Broker, _actor: &Actor) {}

    async fn before_declare_queue(&self, _broker: &Broker, _queue_name: &str) {}
    async fn after_declare_queue(&self, _broker: &Broker, _queue_name: &str) {}
    async fn after_declare_delay_queue(&self, _broker: &Broker, _queue_name: &str) {}

    async fn before_enqueue(&self, _broker: &Broker, _message: &Message, _delay: Option<Duration>) {
    }
    async fn after_enqueue(&self, _broker: &Broker, _message: &Message, _delay: Option<Duration>) {}

    /// Called before a delayed message is held in worker memory.
    async fn before_delay_message(&self, _broker: &Broker, _message: &Message) {}

    /// Called before a message is processed. Returning
    /// [`BeforeProcessFlow::Skip`] redirects the attempt to the skipped
    /// path; no later middleware sees this hook for the attempt.
    async fn before_process_message(&self, _broker: &Broker, _message: &Message) -> BeforeProcessFlow {
        BeforeProcessFlow::Continue
    }

    /// Called after a message has been processed, with the produced value
    /// or the actor failure. Mutually exclusive with
    /// [`Middleware::after_skip_message`] and
    /// [`Middleware::after_message_canceled`] for one attempt.
    async fn after_process_message(
        &self,
        _broker: &Broker,
        _message: &Message,
        _outcome: &ProcessOutcome,
    ) {
    }

    /// Called instead of `after_process_message` when the attempt was
    /// skipped.
    async fn after_skip_message(&self, _broker: &Broker, _message: &Message) {}

    /// Called instead of `after_process_message` when cancellation intent
    /// was observed for the message.
    async fn after_message_canceled(&self, _broker: &Broker, _message: &Message) {}

    async fn before_ack(&self, _broker: &Broker, _message: &Message) {}
    async fn after_ack(&self, _broker: &Broker, _message: &Message) {}
    async fn before_nack(&self, _broker: &Broker, _message: &Message) {}
    async fn after_nack(&self, _broker: &Broker, _message: &Message) {}

    async fn after_process_boot(&self, _broker: &Broker) {}
    async fn before_process_stop(&self, _broker: &Broker) {}
    async fn before_worker_boot(&self, _broker: &Broker) {}
    async fn after_worker_boot(&self, _broker: &Broker) {}
    async fn before_worker_shutdown(&self, _broker: &Broker) {}
    async fn after_worker_shutdown(&self, _broker: &Broker) {}
    async fn before_consumer_shutdown(&self, _broker: &Broker) {}
    async fn before_worker_thread_shutdown(&self, _broker: &Broker) {}

    /// Called once the next stage of a pipeline has been enqueued.
    async fn after_enqueue_pipe_target(&self, _broker: &Broker, _group_info: Option<&GroupInfo>) {}

    /// Called before a fan-out group's constituent messages are enqueued.
    async fn before_build_group_pipeline(
        &self,
        _broker: &Broker,
        _group_id: &str,
        _message_ids: &[String],
    ) {
    }

    /// Pure transform applied once at message construction time. The
    /// broker folds this over the registered middleware in order; each
    /// return value becomes the options passed to the next middleware.
    fn update_options_before_create_message(
        &self,
        options: OptionsMap,
        _broker: &Broker,
        _actor_name: &str,
    ) -> OptionsMap {
        options
    }
}
