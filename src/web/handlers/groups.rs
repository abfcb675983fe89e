//! # Group Listing Handler
//!
//! Aggregated group views, paginated over groups rather than messages.
//! Member entries are trimmed to their lifecycle fields; args, kwargs and
//! options stay on the per-message state endpoint.

use crate::state::filter::StateFilter;
use crate::state::groups::build_groups;
use crate::state::{State, StateStatus};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::handlers::states::PageRequest;
use crate::web::state::AppState;
use axum::extract::State as AxumState;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GroupMessageView {
    pub message_id: String,
    pub status: StateStatus,
    pub actor_name: String,
    pub priority: Option<i32>,
    pub group_id: Option<String>,
    pub enqueued_datetime: Option<DateTime<Utc>>,
    pub started_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
}

impl From<State> for GroupMessageView {
    fn from(state: State) -> Self {
        Self {
            message_id: state.message_id,
            status: state.status,
            actor_name: state.actor_name,
            priority: state.priority,
            group_id: state.group_id,
            enqueued_datetime: state.enqueued_datetime,
            started_datetime: state.started_datetime,
            end_datetime: state.end_datetime,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub group_id: String,
    pub messages: Vec<GroupMessageView>,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub data: Vec<GroupView>,
    /// Total group count before pagination.
    pub count: usize,
}

/// List groups: POST /groups
pub async fn list_groups(
    AxumState(app): AxumState<AppState>,
    Json(request): Json<PageRequest>,
) -> ApiResult<Json<GroupsResponse>> {
    request.validate()?;
    let store = app.state_store()?;
    let filter = StateFilter {
        get_groups: true,
        ..StateFilter::default()
    };
    let states = store.get_states(&filter).await.map_err(ApiError::from)?;
    let page = build_groups(states, request.offset, Some(request.size));

    let data = page
        .groups
        .into_iter()
        .map(|group| GroupView {
            group_id: group.group_id,
            messages: group.messages.into_iter().map(GroupMessageView::from).collect(),
        })
        .collect();
    Ok(Json(GroupsResponse {
        data,
        count: page.total,
    }))
}
