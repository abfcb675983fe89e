//! # Lifecycle State Tracking
//!
//! The persisted lifecycle snapshot of one message and everything that
//! stores, filters and aggregates it. Exactly one state record is
//! addressable per live message id; writes are last-write-wins with a TTL
//! applied by the backing store.

pub mod backends;
pub mod filter;
pub mod groups;
pub mod middleware;
pub mod store;

use crate::message::{Message, OptionsMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle status of one message.
///
/// `Pending → Started → {Success, Failure}`; `Pending → Skipped` bypasses
/// `Started`; `Canceled` may arrive any time before a terminal outcome is
/// recorded. Stores accept writes for already-terminal records; duplicate
/// or racing lifecycle deliveries are last-write-wins, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStatus {
    /// Enqueued, not yet picked up.
    Pending,
    /// An execution attempt is underway.
    Started,
    /// The actor body returned a value.
    Success,
    /// The actor body failed.
    Failure,
    /// A before-process hook redirected the attempt.
    Skipped,
    /// Cancellation intent was observed before a terminal outcome.
    Canceled,
}

impl StateStatus {
    /// Terminal states are leaves with no further legal transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failure | Self::Skipped | Self::Canceled
        )
    }

    /// Check if an execution attempt is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for StateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Started => write!(f, "started"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Skipped => write!(f, "skipped"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl std::str::FromStr for StateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "started" => Ok(Self::Started),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "skipped" => Ok(Self::Skipped),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Invalid state status: {s}")),
        }
    }
}

/// The persisted lifecycle snapshot of one message, keyed by
/// `message_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    pub message_id: String,
    pub status: StateStatus,
    pub actor_name: String,
    pub args: Vec<Value>,
    pub kwargs: OptionsMap,
    pub options: OptionsMap,
    pub priority: Option<i32>,
    pub group_id: Option<String>,
    pub enqueued_datetime: Option<DateTime<Utc>>,
    pub started_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
}

impl State {
    /// Snapshot of a message's immutable fields plus a status. Datetimes,
    /// priority and group are filled in by the hook that knows them.
    pub fn snapshot(message: &Message, status: StateStatus) -> Self {
        Self {
            message_id: message.message_id.clone(),
            status,
            actor_name: message.actor_name.clone(),
            args: message.args.clone(),
            kwargs: message.kwargs.clone(),
            options: message.options.clone(),
            priority: None,
            group_id: None,
            enqueued_datetime: None,
            started_datetime: None,
            end_datetime: None,
        }
    }

    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_group_id(mut self, group_id: Option<String>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_enqueued_datetime(mut self, at: DateTime<Utc>) -> Self {
        self.enqueued_datetime = Some(at);
        self
    }

    pub fn with_started_datetime(mut self, at: DateTime<Utc>) -> Self {
        self.started_datetime = Some(at);
        self
    }

    pub fn with_end_datetime(mut self, at: DateTime<Utc>) -> Self {
        self.end_datetime = Some(at);
        self
    }

    /// Merge-upsert semantics: fields this write did not supply keep the
    /// previously stored value, so an earlier hook's `enqueued_datetime`
    /// survives the transition to `Started`. Status and the message's
    /// immutable fields always take the incoming value.
    pub fn merge_onto(mut self, previous: &State) -> Self {
        if self.priority.is_none() {
            self.priority = previous.priority;
        }
        if self.group_id.is_none() {
            self.group_id = previous.group_id.clone();
        }
        if self.enqueued_datetime.is_none() {
            self.enqueued_datetime = previous.enqueued_datetime;
        }
        if self.started_datetime.is_none() {
            self.started_datetime = previous.started_datetime;
        }
        if self.end_datetime.is_none() {
            self.end_datetime = previous.end_datetime;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_classification() {
        assert!(StateStatus::Success.is_terminal());
        assert!(StateStatus::Failure.is_terminal());
        assert!(StateStatus::Skipped.is_terminal());
        assert!(StateStatus::Canceled.is_terminal());
        assert!(!StateStatus::Pending.is_terminal());
        assert!(!StateStatus::Started.is_terminal());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(StateStatus::Started.to_string(), "started");
        assert_eq!("canceled".parse::<StateStatus>().unwrap(), StateStatus::Canceled);
        assert!("bogus".parse::<StateStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&StateStatus::Success).unwrap();
        assert_eq!(json, "\"success\"");
        let parsed: StateStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StateStatus::Success);
    }

    #[test]
    fn test_merge_retains_earlier_fields() {
        let message = Message::new(
            "send_email",
            vec![json!("a@example.com")],
            OptionsMap::new(),
            OptionsMap::new(),
        );
        let now = Utc::now();
        let pending = State::snapshot(&message, StateStatus::Pending)
            .with_enqueued_datetime(now)
            .with_priority(Some(3))
            .with_group_id(Some("g-1".to_string()));

        let started = State::snapshot(&message, StateStatus::Started)
            .with_started_datetime(now)
            .merge_onto(&pending);

        assert_eq!(started.status, StateStatus::Started);
        assert_eq!(started.enqueued_datetime, Some(now));
        assert_eq!(started.priority, Some(3));
        assert_eq!(started.group_id, Some("g-1".to_string()));
        assert_eq!(started.started_datetime, Some(now));
    }
}
