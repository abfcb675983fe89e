//! # Composition Helpers
//!
//! Builders for the two higher-level shapes producers enqueue: pipelines,
//! where one message's completion enqueues the next stage through the
//! `pipe_target` option, and groups, where messages share a producer
//! assigned group id through the `group_info` option.

use crate::broker::Broker;
use crate::error::{CourierError, Result};
use crate::message::{GroupInfo, Message, GROUP_INFO, PIPE_TARGET};
use uuid::Uuid;

/// Chain messages into a pipeline: each stage's `pipe_target` carries the
/// next stage, so completing one enqueues the following. Returns the head
/// message; only the head should be enqueued.
pub fn pipeline(mut messages: Vec<Message>) -> Result<Message> {
    if messages.is_empty() {
        return Err(CourierError::Internal(
            "a pipeline needs at least one message".to_string(),
        ));
    }
    let mut next: Option<Message> = None;
    while let Some(message) = messages.pop() {
        let staged = match next.take() {
            Some(target) => {
                message.with_option(PIPE_TARGET, serde_json::to_value(&target)?)
            }
            None => message,
        };
        next = Some(staged);
    }
    // The loop always leaves the head behind.
    Ok(next.expect("non-empty pipeline"))
}

/// A fan-out group of messages sharing a group id.
#[derive(Debug, Clone)]
pub struct MessageGroup {
    pub group_id: String,
    pub messages: Vec<Message>,
}

impl MessageGroup {
    /// Stamp every member with this group's `group_info` option.
    pub fn new(messages: Vec<Message>) -> Self {
        Self::with_group_id(Uuid::new_v4().to_string(), messages)
    }

    pub fn with_group_id(group_id: impl Into<String>, messages: Vec<Message>) -> Self {
        let group_id = group_id.into();
        let info = GroupInfo {
            group_id: group_id.clone(),
            message_count: Some(messages.len()),
        };
        let messages = messages
            .into_iter()
            .map(|message| {
                let value = serde_json::to_value(&info).expect("group info serializes");
                message.with_option(GROUP_INFO, value)
            })
            .collect();
        Self { group_id, messages }
    }

    pub fn message_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|message| message.message_id.clone())
            .collect()
    }

    /// Notify middleware that the group is about to be built, then
    /// enqueue every member.
    pub async fn enqueue(&self, broker: &Broker) -> Result<()> {
        broker
            .emit_before_build_group_pipeline(&self.group_id, &self.message_ids())
            .await;
        for message in &self.messages {
            broker.enqueue(message, None).await?;
        }
        Ok(())
    }
}
