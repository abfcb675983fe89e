//! # Broker & Hook Dispatcher
//!
//! The broker owns the ordered middleware list and the actor registry, and
//! drives every lifecycle hook in registration order around each
//! transition. All collaborators — state store, result backend, cancel
//! backend, scheduler — are injected at construction and threaded through
//! calls; there is no ambient global broker.
//!
//! Hooks for a single message's single lifecycle event run sequentially on
//! the calling task. Different messages may be processed concurrently by
//! independent workers; only per-message ordering is guaranteed.

use crate::actor::Actor;
use crate::cancel::{CancelBackend, InMemoryCancelBackend};
use crate::error::{CourierError, Result};
use crate::message::{Message, OptionsMap, PIPE_TARGET};
use crate::middleware::{BeforeProcessFlow, Middleware, ProcessOutcome};
use crate::results::ResultBackend;
use crate::scheduler::Scheduler;
use crate::state::store::StateStore;
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How one execution attempt ended.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// The actor body ran; the payload carries its value or failure.
    Processed(ProcessOutcome),
    /// A before-process hook redirected the attempt.
    Skipped,
    /// Cancellation intent was observed before the body ran.
    Canceled,
}

/// Builder for [`Broker`]. Middleware registration order is fixed at
/// build time and preserved for the lifetime of the process.
#[derive(Default)]
pub struct BrokerBuilder {
    middleware: Vec<Arc<dyn Middleware>>,
    state_store: Option<Arc<dyn StateStore>>,
    result_backend: Option<Arc<dyn ResultBackend>>,
    cancel_backend: Option<Arc<dyn CancelBackend>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl BrokerBuilder {
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn result_backend(mut self, backend: Arc<dyn ResultBackend>) -> Self {
        self.result_backend = Some(backend);
        self
    }

    pub fn cancel_backend(mut self, backend: Arc<dyn CancelBackend>) -> Self {
        self.cancel_backend = Some(backend);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Broker {
        Broker {
            middleware: self.middleware,
            actors: DashMap::new(),
            queues: DashSet::new(),
            delay_queues: DashSet::new(),
            state_store: self.state_store,
            result_backend: self.result_backend,
            cancel_backend: self
                .cancel_backend
                .unwrap_or_else(|| Arc::new(InMemoryCancelBackend::new())),
            scheduler: self.scheduler,
        }
    }
}

/// The hook dispatcher plus the registries it needs to route work.
pub struct Broker {
    middleware: Vec<Arc<dyn Middleware>>,
    actors: DashMap<String, Arc<Actor>>,
    queues: DashSet<String>,
    delay_queues: DashSet<String>,
    state_store: Option<Arc<dyn StateStore>>,
    result_backend: Option<Arc<dyn ResultBackend>>,
    cancel_backend: Arc<dyn CancelBackend>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl Broker {
    pub fn builder() -> BrokerBuilder {
        BrokerBuilder::default()
    }

    pub fn state_store(&self) -> Option<&Arc<dyn StateStore>> {
        self.state_store.as_ref()
    }

    pub fn result_backend(&self) -> Option<&Arc<dyn ResultBackend>> {
        self.result_backend.as_ref()
    }

    pub fn scheduler(&self) -> Option<&Arc<dyn Scheduler>> {
        self.scheduler.as_ref()
    }

    /// Look up a declared actor by name.
    pub fn get_actor(&self, name: &str) -> Result<Arc<Actor>> {
        self.actors
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CourierError::UnknownActor(name.to_string()))
    }

    /// All declared actors.
    pub fn actors(&self) -> Vec<Arc<Actor>> {
        let mut actors: Vec<Arc<Actor>> = self
            .actors
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        actors.sort_by(|a, b| a.name.cmp(&b.name));
        actors
    }

    /// Union of option names recognized across registered middleware.
    pub fn actor_options(&self) -> BTreeSet<String> {
        self.middleware
            .iter()
            .flat_map(|middleware| middleware.actor_options().iter().map(|name| name.to_string()))
            .collect()
    }

    /// Register an actor, declaring its queue on first sight.
    pub async fn declare_actor(&self, actor: Actor) -> Result<Arc<Actor>> {
        let actor = Arc::new(actor);
        for middleware in &self.middleware {
            middleware.before_declare_actor(self, &actor).await;
        }
        self.declare_queue(&actor.queue_name).await;
        self.actors.insert(actor.name.clone(), actor.clone());
        for middleware in &self.middleware {
            middleware.after_declare_actor(self, &actor).await;
        }
        info!(actor = %actor.name, queue = %actor.queue_name, "actor declared");
        Ok(actor)
    }

    /// Declare a queue. Hooks fire only the first time a name is seen.
    pub async fn declare_queue(&self, queue_name: &str) {
        if !self.queues.insert(queue_name.to_string()) {
            return;
        }
        for middleware in &self.middleware {
            middleware.before_declare_queue(self, queue_name).await;
        }
        for middleware in &self.middleware {
            middleware.after_declare_queue(self, queue_name).await;
        }
    }

    /// Declare a delay queue. Hooks fire only the first time.
    pub async fn declare_delay_queue(&self, queue_name: &str) {
        if !self.delay_queues.insert(queue_name.to_string()) {
            return;
        }
        for middleware in &self.middleware {
            middleware.after_declare_delay_queue(self, queue_name).await;
        }
    }

    /// Build a message for a declared actor, folding the options through
    /// every middleware's `update_options_before_create_message` in
    /// registration order — each return value feeds the next middleware,
    /// last writer wins.
    pub fn build_message(
        &self,
        actor_name: &str,
        args: Vec<Value>,
        kwargs: OptionsMap,
        options: OptionsMap,
    ) -> Result<Message> {
        self.get_actor(actor_name)?;
        let mut options = options;
        for middleware in &self.middleware {
            options = middleware.update_options_before_create_message(options, self, actor_name);
        }
        Ok(Message::new(actor_name, args, kwargs, options))
    }

    /// Hand a message to the (external) transport, firing the enqueue
    /// hooks around the handoff.
    pub async fn enqueue(&self, message: &Message, delay: Option<Duration>) -> Result<()> {
        self.get_actor(&message.actor_name)?;
        for middleware in &self.middleware {
            middleware.before_enqueue(self, message, delay).await;
        }
        debug!(
            message_id = %message.message_id,
            actor = %message.actor_name,
            delay_ms = delay.map(|d| d.as_millis() as u64),
            "message enqueued"
        );
        for middleware in &self.middleware {
            middleware.after_enqueue(self, message, delay).await;
        }
        Ok(())
    }

    /// Build and enqueue in one step.
    pub async fn send(
        &self,
        actor_name: &str,
        args: Vec<Value>,
        kwargs: OptionsMap,
        options: OptionsMap,
    ) -> Result<Message> {
        let message = self.build_message(actor_name, args, kwargs, options)?;
        self.enqueue(&message, None).await?;
        Ok(message)
    }

    /// Called by a worker before holding a delayed message in memory.
    pub async fn delay_message(&self, message: &Message) {
        for middleware in &self.middleware {
            middleware.before_delay_message(self, message).await;
        }
    }

    /// Run one full execution attempt for a message on the calling task:
    /// cancel check, before hooks (honoring the skip signal), the actor
    /// body, exactly one terminal after hook, pipeline chaining, then
    /// broker acknowledgement.
    pub async fn process_message(&self, message: &Message) -> Result<AttemptOutcome> {
        let actor = self.get_actor(&message.actor_name)?;

        if self.cancel_backend.is_canceled(&message.message_id).await {
            for middleware in &self.middleware {
                middleware.after_message_canceled(self, message).await;
            }
            self.ack(message).await;
            debug!(message_id = %message.message_id, "message canceled before processing");
            return Ok(AttemptOutcome::Canceled);
        }

        for middleware in &self.middleware {
            if middleware.before_process_message(self, message).await == BeforeProcessFlow::Skip {
                for middleware in &self.middleware {
                    middleware.after_skip_message(self, message).await;
                }
                self.ack(message).await;
                debug!(message_id = %message.message_id, "message skipped");
                return Ok(AttemptOutcome::Skipped);
            }
        }

        let outcome = match actor.invoke(&message.args, &message.kwargs).await {
            Ok(value) => ProcessOutcome::Success(value),
            Err(error) => ProcessOutcome::Failure(error),
        };

        for middleware in &self.middleware {
            middleware.after_process_message(self, message, &outcome).await;
        }

        if outcome.is_success() {
            self.enqueue_pipe_target(message).await;
            self.ack(message).await;
        } else {
            self.nack(message).await;
        }

        Ok(AttemptOutcome::Processed(outcome))
    }

    /// When the completed message carries a `pipe_target`, enqueue the
    /// next pipeline stage and notify middleware.
    async fn enqueue_pipe_target(&self, message: &Message) {
        let Some(target) = message.option(PIPE_TARGET) else {
            return;
        };
        let next: Message = match serde_json::from_value(target.clone()) {
            Ok(next) => next,
            Err(error) => {
                warn!(message_id = %message.message_id, %error, "malformed pipe_target option");
                return;
            }
        };
        if let Err(error) = self.enqueue(&next, None).await {
            warn!(message_id = %message.message_id, %error, "failed to enqueue pipe target");
            return;
        }
        let group_info = message.group_info();
        for middleware in &self.middleware {
            middleware
                .after_enqueue_pipe_target(self, group_info.as_ref())
                .await;
        }
    }

    /// Broker acknowledgement of a handled message.
    pub async fn ack(&self, message: &Message) {
        for middleware in &self.middleware {
            middleware.before_ack(self, message).await;
        }
        for middleware in &self.middleware {
            middleware.after_ack(self, message).await;
        }
    }

    /// Broker rejection of a failed message.
    pub async fn nack(&self, message: &Message) {
        for middleware in &self.middleware {
            middleware.before_nack(self, message).await;
        }
        for middleware in &self.middleware {
            middleware.after_nack(self, message).await;
        }
    }

    /// Record cancellation intent for a message id. Best-effort and
    /// advisory: the worker observes the intent cooperatively.
    pub async fn cancel(&self, message_id: &str) {
        self.cancel_backend.cancel(&[message_id.to_string()]).await;
        debug!(%message_id, "cancellation requested");
    }

    /// Re-submit a stored message: same actor, args, kwargs and options,
    /// fresh message id. Refused for pipeline stages — re-running one
    /// stage in isolation would violate the pipeline's ordering.
    pub async fn requeue(&self, message_id: &str) -> Result<Message> {
        let store = self.state_store.as_ref().ok_or_else(|| {
            CourierError::Configuration("no state store configured".to_string())
        })?;
        let state = store
            .get_state(message_id)
            .await?
            .ok_or_else(|| CourierError::MessageNotFound(message_id.to_string()))?;
        if state
            .options
            .get(PIPE_TARGET)
            .filter(|value| !value.is_null())
            .is_some()
        {
            return Err(CourierError::PipelineRequeue);
        }
        self.send(&state.actor_name, state.args, state.kwargs, state.options)
            .await
    }

    /// Emit `before_build_group_pipeline` on every middleware; used by
    /// the composition helpers before a group's members are enqueued.
    pub async fn emit_before_build_group_pipeline(&self, group_id: &str, message_ids: &[String]) {
        for middleware in &self.middleware {
            middleware
                .before_build_group_pipeline(self, group_id, message_ids)
                .await;
        }
    }

    pub async fn emit_after_process_boot(&self) {
        for middleware in &self.middleware {
            middleware.after_process_boot(self).await;
        }
    }

    pub async fn emit_before_process_stop(&self) {
        for middleware in &self.middleware {
            middleware.before_process_stop(self).await;
        }
    }

    pub async fn emit_before_worker_boot(&self) {
        for middleware in &self.middleware {
            middleware.before_worker_boot(self).await;
        }
    }

    pub async fn emit_after_worker_boot(&self) {
        for middleware in &self.middleware {
            middleware.after_worker_boot(self).await;
        }
    }

    pub async fn emit_before_worker_shutdown(&self) {
        for middleware in &self.middleware {
            middleware.before_worker_shutdown(self).await;
        }
    }

    pub async fn emit_after_worker_shutdown(&self) {
        for middleware in &self.middleware {
            middleware.after_worker_shutdown(self).await;
        }
    }

    pub async fn emit_before_consumer_shutdown(&self) {
        for middleware in &self.middleware {
            middleware.before_consumer_shutdown(self).await;
        }
    }

    pub async fn emit_before_worker_thread_shutdown(&self) {
        for middleware in &self.middleware {
            middleware.before_worker_thread_shutdown(self).await;
        }
    }
}
