//! # Message Descriptor
//!
//! The immutable unit of work addressed to an actor. A message is owned by
//! its creator until handed to a transport; the executing worker owns it
//! afterwards. Options are an open key/value map with two reserved keys
//! that only ever make sense at the message level: [`PIPE_TARGET`] and
//! [`GROUP_INFO`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Options key holding the serialized next stage of a pipeline.
pub const PIPE_TARGET: &str = "pipe_target";
/// Options key holding group membership information.
pub const GROUP_INFO: &str = "group_info";

/// Open key/value mapping used for message, actor and middleware options.
pub type OptionsMap = serde_json::Map<String, Value>;

/// One unit of work addressed to an actor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique id, generated at creation.
    pub message_id: String,
    /// Name of the addressed actor.
    pub actor_name: String,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: OptionsMap,
    /// Arbitrary per-message options.
    pub options: OptionsMap,
    /// Optional per-message priority override.
    pub priority: Option<i32>,
}

impl Message {
    /// Build a new message with a fresh id.
    pub fn new(
        actor_name: impl Into<String>,
        args: Vec<Value>,
        kwargs: OptionsMap,
        options: OptionsMap,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            actor_name: actor_name.into(),
            args,
            kwargs,
            options,
            priority: None,
        }
    }

    /// Consume and return the message with an extra option set. Intended
    /// for composition helpers that decorate messages before enqueue.
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Look up an option by name. Presence-check semantics: a key mapped
    /// to JSON null counts as absent, any other value (empty string, zero)
    /// counts as present.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name).filter(|value| !value.is_null())
    }

    /// The typed group membership carried in the options, if any.
    pub fn group_info(&self) -> Option<GroupInfo> {
        self.option(GROUP_INFO)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// Group membership as stored under the `group_info` option key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupInfo {
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}
