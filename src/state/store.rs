//! # State Store Contract
//!
//! The keyed, mutable, TTL-bearing persistence layer for per-message state
//! snapshots. Only the lifecycle hook path writes through this contract;
//! the observability surface reads from it.

use crate::error::{CourierError, Result};
use crate::state::filter::StateFilter;
use crate::state::State;
use async_trait::async_trait;

/// Persistence contract for lifecycle state snapshots.
///
/// Implementations must make single-key writes atomic; concurrent writes
/// to the same message id are last-write-wins by design. Listing order is
/// implementation-defined but must be stable across identical calls
/// absent mutation.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Merge-upsert the snapshot under its message id and reset the
    /// record's expiry to `ttl_seconds` from now. Never fails on a
    /// missing prior record.
    async fn set_state(&self, state: State, ttl_seconds: i64) -> Result<()>;

    /// Point lookup; expired records are absent.
    async fn get_state(&self, message_id: &str) -> Result<Option<State>>;

    /// Filtered, paginated listing.
    async fn get_states(&self, filter: &StateFilter) -> Result<Vec<State>>;

    /// Total records matching the filter, ignoring pagination.
    async fn count_states(&self, filter: &StateFilter) -> Result<u64>;

    /// Whether this store implements [`StateStore::clean`]. Advertised to
    /// the API surface so unsupported deletion is a declared condition.
    fn supports_clean(&self) -> bool {
        false
    }

    /// Bulk delete matching records, returning how many were removed.
    /// Backends without transactional bulk delete must reject rather than
    /// silently no-op.
    async fn clean(&self, _filter: &StateFilter) -> Result<u64> {
        Err(CourierError::UnsupportedOperation(
            "deleting states is not supported by this state store".to_string(),
        ))
    }
}
