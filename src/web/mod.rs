//! # Operational HTTP API
//!
//! The observability and control surface over the broker: list, filter
//! and delete message states, cancel and requeue messages, fetch results,
//! inspect actors, groups, options and scheduled jobs. It reads from the
//! state store and backends; lifecycle state is only ever written by the
//! hook dispatcher path.

pub mod errors;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use state::AppState;

/// Build the API router over the shared application state.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/messages", post(handlers::messages::enqueue_message))
        .route(
            "/messages/states",
            post(handlers::states::list_states).delete(handlers::states::clean_states),
        )
        .route("/messages/state/:message_id", get(handlers::states::get_state))
        .route("/messages/cancel/:message_id", post(handlers::messages::cancel_message))
        .route("/messages/requeue/:message_id", get(handlers::messages::requeue_message))
        .route("/messages/result/:message_id", get(handlers::messages::get_result))
        .route("/scheduled/jobs", get(handlers::actors::scheduled_jobs))
        .route("/actors", get(handlers::actors::list_actors))
        .route("/groups", post(handlers::groups::list_groups))
        .route("/options", get(handlers::actors::list_options))
        .with_state(app_state)
}
