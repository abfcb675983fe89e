//! # Group Aggregation
//!
//! Derived, non-persisted views over the flat stream of state snapshots:
//! records sharing a group id bucketed together, groups ordered by their
//! first member's enqueue time (most recent first), pagination applied to
//! the group list rather than the underlying messages.

use crate::state::State;
use serde::Serialize;

/// One group of messages sharing a group id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupMessages {
    pub group_id: String,
    pub messages: Vec<State>,
}

/// A page of groups plus the pre-pagination group count.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupPage {
    pub groups: Vec<GroupMessages>,
    pub total: usize,
}

/// Bucket `states` by group id (ungrouped records excluded), keeping the
/// store's stable order within each bucket, sort groups by the first
/// member's `enqueued_datetime` descending — a missing datetime sorts as
/// the minimum value, so undated groups land last — and apply
/// `offset`/`size` to the group list.
pub fn build_groups(states: Vec<State>, offset: usize, size: Option<usize>) -> GroupPage {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: std::collections::HashMap<String, Vec<State>> =
        std::collections::HashMap::new();

    for state in states {
        let Some(group_id) = state.group_id.clone() else {
            continue;
        };
        if !buckets.contains_key(&group_id) {
            order.push(group_id.clone());
        }
        buckets.entry(group_id).or_default().push(state);
    }

    let mut groups: Vec<GroupMessages> = order
        .into_iter()
        .map(|group_id| {
            let messages = buckets.remove(&group_id).unwrap_or_default();
            GroupMessages { group_id, messages }
        })
        .collect();

    // Option's ordering treats None as the minimum, which is exactly the
    // missing-datetime rule; the sort is stable so first-seen order
    // breaks ties.
    groups.sort_by(|a, b| {
        let a_key = a.messages.first().and_then(|m| m.enqueued_datetime);
        let b_key = b.messages.first().and_then(|m| m.enqueued_datetime);
        b_key.cmp(&a_key)
    });

    let total = groups.len();
    let paged: Vec<GroupMessages> = match size {
        Some(size) => groups.into_iter().skip(offset).take(size).collect(),
        None => groups.into_iter().skip(offset).collect(),
    };

    GroupPage {
        groups: paged,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, OptionsMap};
    use crate::state::StateStatus;
    use chrono::{Duration, Utc};

    fn grouped_state(group_id: &str, enqueued_offset_secs: Option<i64>) -> State {
        let message = Message::new("work", vec![], OptionsMap::new(), OptionsMap::new());
        let mut state =
            State::snapshot(&message, StateStatus::Pending).with_group_id(Some(group_id.to_string()));
        if let Some(secs) = enqueued_offset_secs {
            state.enqueued_datetime = Some(Utc::now() + Duration::seconds(secs));
        }
        state
    }

    #[test]
    fn test_groups_ordered_by_first_member_enqueue_descending() {
        // {A: [t=10], B: [t=30], A: [t=20]} must produce B before A, with
        // A holding both of its messages.
        let states = vec![
            grouped_state("A", Some(10)),
            grouped_state("B", Some(30)),
            grouped_state("A", Some(20)),
        ];
        let page = build_groups(states, 0, None);

        assert_eq!(page.total, 2);
        assert_eq!(page.groups[0].group_id, "B");
        assert_eq!(page.groups[1].group_id, "A");
        assert_eq!(page.groups[1].messages.len(), 2);
    }

    #[test]
    fn test_ungrouped_records_excluded() {
        let message = Message::new("work", vec![], OptionsMap::new(), OptionsMap::new());
        let ungrouped = State::snapshot(&message, StateStatus::Pending);
        let page = build_groups(vec![ungrouped, grouped_state("A", Some(1))], 0, None);
        assert_eq!(page.total, 1);
        assert_eq!(page.groups[0].group_id, "A");
    }

    #[test]
    fn test_missing_datetime_sorts_last() {
        let states = vec![grouped_state("undated", None), grouped_state("dated", Some(5))];
        let page = build_groups(states, 0, None);
        assert_eq!(page.groups[0].group_id, "dated");
        assert_eq!(page.groups[1].group_id, "undated");
    }

    #[test]
    fn test_pagination_applies_to_groups_not_messages() {
        let states = vec![
            grouped_state("A", Some(30)),
            grouped_state("A", Some(29)),
            grouped_state("B", Some(20)),
            grouped_state("C", Some(10)),
        ];
        let page = build_groups(states, 1, Some(1));
        assert_eq!(page.total, 3);
        assert_eq!(page.groups.len(), 1);
        assert_eq!(page.groups[0].group_id, "B");
    }
}
