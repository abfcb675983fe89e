//! # Scheduler Handle
//!
//! Optional collaborator: a broker may or may not have a scheduler. Its
//! absence is a distinct, expected condition — the API reports an empty
//! job list, not an error.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recurring job as described by a scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledJob {
    pub actor_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: crate::message::OptionsMap,
    pub interval_seconds: Option<u64>,
    pub enabled: bool,
    pub last_queued: Option<DateTime<Utc>>,
}

/// Read-only view of a scheduler's job table.
pub trait Scheduler: Send + Sync {
    fn scheduled_jobs(&self) -> Vec<ScheduledJob>;
}

/// Static in-process scheduler view, useful for tests and embedded
/// deployments where the schedule is configured at startup.
#[derive(Debug, Default)]
pub struct LocalScheduler {
    jobs: RwLock<Vec<ScheduledJob>>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&self, job: ScheduledJob) {
        self.jobs.write().push(job);
    }
}

impl Scheduler for LocalScheduler {
    fn scheduled_jobs(&self) -> Vec<ScheduledJob> {
        self.jobs.read().clone()
    }
}
