//! # Message Control Handlers
//!
//! Enqueue, cancel, requeue and result retrieval. Cancellation always
//! reports success — it only records intent. Result retrieval is always a
//! 200 whose body carries either the payload or a classified reason.

use crate::message::OptionsMap;
use crate::results::encoded_result;
use crate::web::errors::{ApiError, ApiResult};
use crate::web::state::AppState;
use axum::extract::{Path, State as AxumState};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Payload for enqueueing a message by actor name.
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub actor_name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: OptionsMap,
    #[serde(default)]
    pub options: OptionsMap,
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

/// Enqueue a message: POST /messages
pub async fn enqueue_message(
    AxumState(app): AxumState<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> ApiResult<Json<Value>> {
    if request.actor_name.is_empty() {
        return Err(ApiError::validation("actor_name", "must not be empty"));
    }
    let message = app
        .broker
        .build_message(&request.actor_name, request.args, request.kwargs, request.options)
        .map_err(ApiError::from)?;
    let delay = request.delay_ms.map(Duration::from_millis);
    app.broker
        .enqueue(&message, delay)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(json!({ "result": "ok", "message_id": message.message_id })))
}

/// Request cancellation: POST /messages/cancel/{message_id}
pub async fn cancel_message(
    AxumState(app): AxumState<AppState>,
    Path(message_id): Path<String>,
) -> Json<Value> {
    app.broker.cancel(&message_id).await;
    Json(json!({ "result": "ok" }))
}

/// Requeue a stored message: GET /messages/requeue/{message_id}
pub async fn requeue_message(
    AxumState(app): AxumState<AppState>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let message = app.broker.requeue(&message_id).await.map_err(ApiError::from)?;
    Ok(Json(json!({ "result": "ok", "message_id": message.message_id })))
}

/// Fetch a message's result: GET /messages/result/{message_id}
pub async fn get_result(
    AxumState(app): AxumState<AppState>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let fetched = encoded_result(app.broker.result_backend(), &message_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(json!({ "result": fetched.into_display_string() })))
}
