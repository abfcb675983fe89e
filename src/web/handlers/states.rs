//! # State Listing Handlers
//!
//! Filtered, paginated access to lifecycle state plus bulk deletion on
//! stores that support it.

use crate::state::filter::StateFilter;
use crate::state::State;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Path, State as AxumState};
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use serde_json::{json, Value};

pub const MAX_PAGE_SIZE: usize = 1000;
const DEFAULT_PAGE_SIZE: usize = 100;

/// Filter + pagination payload accepted by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub search_value: Option<String>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_size")]
    pub size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl PageRequest {
    pub fn validate(&self) -> ApiResult<()> {
        if self.size > MAX_PAGE_SIZE {
            return Err(ApiError::validation(
                "size",
                format!("must be at most {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }

    fn into_filter(self) -> ApiResult<StateFilter> {
        self.validate()?;
        Ok(StateFilter {
            search_value: self.search_value,
            get_groups: false,
            offset: self.offset,
            size: Some(self.size),
        })
    }
}

/// Deletion filter: same text search, no pagination.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub search_value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatesResponse {
    pub data: Vec<State>,
    /// Total matching records, not the page length.
    pub count: u64,
}

/// List states: POST /messages/states
pub async fn list_states(
    AxumState(app): AxumState<AppState>,
    Json(request): Json<PageRequest>,
) -> ApiResult<Json<StatesResponse>> {
    let filter = request.into_filter()?;
    let store = app.state_store()?;
    let data = store.get_states(&filter).await.map_err(ApiError::from)?;
    let count = store.count_states(&filter).await.map_err(ApiError::from)?;
    Ok(Json(StatesResponse { data, count }))
}

/// Bulk delete states: DELETE /messages/states
pub async fn clean_states(
    AxumState(app): AxumState<AppState>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    let store = app.state_store()?;
    if !store.supports_clean() {
        return Err(ApiError::bad_request(
            "deleting states is not supported by this state store",
        ));
    }
    let filter = StateFilter {
        search_value: request.search_value,
        ..StateFilter::default()
    };
    store.clean(&filter).await.map_err(ApiError::from)?;
    Ok(Json(json!({ "result": "ok" })))
}

/// Get one state: GET /messages/state/{message_id}
pub async fn get_state(
    AxumState(app): AxumState<AppState>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<State>> {
    let store = app.state_store()?;
    let state = store
        .get_state(&message_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("message_id = {message_id} does not exist")))?;
    Ok(Json(state))
}
