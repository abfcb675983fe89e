//! # Actor & Option Discovery Handlers

use crate::web::state::AppState;
use axum::extract::State as AxumState;
use axum::Json;
use serde_json::{json, Value};

/// List declared actors with their options: GET /actors
pub async fn list_actors(AxumState(app): AxumState<AppState>) -> Json<Value> {
    let actors: Vec<_> = app
        .broker
        .actors()
        .iter()
        .map(|actor| actor.description())
        .collect();
    Json(json!({ "result": actors }))
}

/// List every option name registered middleware recognize: GET /options
pub async fn list_options(AxumState(app): AxumState<AppState>) -> Json<Value> {
    let options: Vec<String> = app.broker.actor_options().into_iter().collect();
    Json(json!({ "options": options }))
}

/// List scheduled jobs: GET /scheduled/jobs
///
/// A missing scheduler is an expected condition: the list is empty, the
/// status is still 200.
pub async fn scheduled_jobs(AxumState(app): AxumState<AppState>) -> Json<Value> {
    let jobs = app
        .broker
        .scheduler()
        .map(|scheduler| scheduler.scheduled_jobs())
        .unwrap_or_default();
    Json(json!({ "result": jobs }))
}
