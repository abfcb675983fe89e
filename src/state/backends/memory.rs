//! # In-Memory State Store
//!
//! Process-local store backed by a concurrent map. Expiry is enforced
//! lazily: expired entries are invisible to reads and reaped on the next
//! write. Bulk deletion is not supported; this backend mirrors
//! non-transactional stores, which must reject `clean` rather than no-op.

use crate::error::Result;
use crate::state::filter::StateFilter;
use crate::state::store::StateStore;
use crate::state::State;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone)]
struct StoredState {
    state: State,
    expires_at: DateTime<Utc>,
}

/// Concurrent in-memory state store with lazy TTL expiry.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    records: DashMap<String, StoredState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_expired(&self) {
        let now = Utc::now();
        self.records.retain(|_, stored| stored.expires_at > now);
    }

    /// Live records in listing order: most recently enqueued first,
    /// records without an enqueue time last, message id as tiebreak so
    /// identical calls return identical order.
    fn live_sorted(&self) -> Vec<State> {
        let now = Utc::now();
        let mut states: Vec<State> = self
            .records
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.state.clone())
            .collect();
        states.sort_by(|a, b| {
            b.enqueued_datetime
                .cmp(&a.enqueued_datetime)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });
        states
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn set_state(&self, state: State, ttl_seconds: i64) -> Result<()> {
        self.purge_expired();
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
        let key = state.message_id.clone();
        let merged = match self.records.get(&key) {
            Some(existing) => state.merge_onto(&existing.state),
            None => state,
        };
        self.records.insert(
            key,
            StoredState {
                state: merged,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get_state(&self, message_id: &str) -> Result<Option<State>> {
        let found = self
            .records
            .get(message_id)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| stored.state.clone());
        Ok(found)
    }

    async fn get_states(&self, filter: &StateFilter) -> Result<Vec<State>> {
        let matching: Vec<State> = self
            .live_sorted()
            .into_iter()
            .filter(|state| filter.matches(state))
            .collect();
        Ok(filter.paginate(matching))
    }

    async fn count_states(&self, filter: &StateFilter) -> Result<u64> {
        let count = self
            .live_sorted()
            .iter()
            .filter(|state| filter.matches(state))
            .count();
        Ok(count as u64)
    }
}
