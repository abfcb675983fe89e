//! # State Filtering & Pagination
//!
//! The filter shape shared by every state listing, counting and deletion
//! path, plus the in-process matcher used by the in-memory backend. The
//! Postgres backend translates the same filter into SQL.

use crate::state::State;
use serde::Deserialize;

/// Filter + pagination parameters for state queries.
///
/// `offset`/`size` are zero-based: `size` records starting at `offset`.
/// A `size` of `None` means no bound.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateFilter {
    /// Case-insensitive substring matched against the stringified actor
    /// name, args and kwargs. Fields with no value are excluded from the
    /// match.
    pub search_value: Option<String>,
    /// Restrict to records carrying a non-null group id.
    pub get_groups: bool,
    pub offset: usize,
    pub size: Option<usize>,
}

impl StateFilter {
    pub fn with_search(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }

    pub fn groups_only(mut self) -> Self {
        self.get_groups = true;
        self
    }

    pub fn with_page(mut self, offset: usize, size: usize) -> Self {
        self.offset = offset;
        self.size = Some(size);
        self
    }

    /// Same filter with pagination stripped, for counting totals.
    pub fn unpaginated(&self) -> Self {
        Self {
            search_value: self.search_value.clone(),
            get_groups: self.get_groups,
            offset: 0,
            size: None,
        }
    }

    /// Whether `state` satisfies the non-pagination parts of the filter.
    pub fn matches(&self, state: &State) -> bool {
        if self.get_groups && state.group_id.is_none() {
            return false;
        }
        match &self.search_value {
            None => true,
            Some(needle) => {
                search_haystack(state).contains(&needle.to_lowercase())
            }
        }
    }

    /// Apply `offset`/`size` to an already-filtered, already-sorted list.
    pub fn paginate<T>(&self, items: Vec<T>) -> Vec<T> {
        let mut iter = items.into_iter().skip(self.offset);
        match self.size {
            Some(size) => iter.by_ref().take(size).collect(),
            None => iter.collect(),
        }
    }
}

/// The lowercased text a free-text search runs against: actor name, args
/// and kwargs joined by NUL, with empty collections left out.
fn search_haystack(state: &State) -> String {
    let mut parts = vec![state.actor_name.clone()];
    if !state.args.is_empty() {
        if let Ok(rendered) = serde_json::to_string(&state.args) {
            parts.push(rendered);
        }
    }
    if !state.kwargs.is_empty() {
        if let Ok(rendered) = serde_json::to_string(&state.kwargs) {
            parts.push(rendered);
        }
    }
    parts.join("\0").to_lowercase()
}
