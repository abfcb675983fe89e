//! # Actors
//!
//! A named, registered unit of executable job logic. Actors are declared
//! with the broker at startup; the handler body runs on whatever worker
//! picks the message up.

use crate::message::OptionsMap;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Failure raised by an actor body. Carried into
/// `after_process_message` as the exception side of the outcome.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ActorError(pub String);

impl ActorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The executable body of an actor.
#[async_trait]
pub trait ActorHandler: Send + Sync {
    async fn invoke(&self, args: &[Value], kwargs: &OptionsMap) -> Result<Value, ActorError>;
}

/// A named, declared unit of job logic plus its configuration.
#[derive(Clone)]
pub struct Actor {
    pub name: String,
    pub queue_name: String,
    pub priority: i32,
    pub options: OptionsMap,
    handler: Arc<dyn ActorHandler>,
}

impl Actor {
    pub fn new(name: impl Into<String>, handler: Arc<dyn ActorHandler>) -> Self {
        Self {
            name: name.into(),
            queue_name: "default".to_string(),
            priority: 0,
            options: OptionsMap::new(),
            handler,
        }
    }

    /// Convenience constructor wrapping a synchronous function body.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value], &OptionsMap) -> Result<Value, ActorError> + Send + Sync + 'static,
    {
        Self::new(name, Arc::new(FnHandler { f }))
    }

    pub fn with_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_options(mut self, options: OptionsMap) -> Self {
        self.options = options;
        self
    }

    /// Actor-level option lookup, same presence semantics as message
    /// options: JSON null counts as absent.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name).filter(|value| !value.is_null())
    }

    /// Run the actor body.
    pub async fn invoke(&self, args: &[Value], kwargs: &OptionsMap) -> Result<Value, ActorError> {
        self.handler.invoke(args, kwargs).await
    }

    /// Describable shape for the operational API.
    pub fn description(&self) -> ActorDescription {
        ActorDescription {
            name: self.name.clone(),
            queue_name: self.queue_name.clone(),
            priority: self.priority,
            options: self.options.clone(),
        }
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("queue_name", &self.queue_name)
            .field("priority", &self.priority)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Serializable actor description exposed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ActorDescription {
    pub name: String,
    pub queue_name: String,
    pub priority: i32,
    pub options: OptionsMap,
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F> ActorHandler for FnHandler<F>
where
    F: Fn(&[Value], &OptionsMap) -> Result<Value, ActorError> + Send + Sync,
{
    async fn invoke(&self, args: &[Value], kwargs: &OptionsMap) -> Result<Value, ActorError> {
        (self.f)(args, kwargs)
    }
}
