//! # Web API Application State
//!
//! The shared state every request handler sees: the broker, which carries
//! the injected store and backend handles.

use crate::broker::Broker;
use crate::state::store::StateStore;
use crate::web::errors::{ApiError, ApiResult};
use std::sync::Arc;

/// Shared application state for the operational API.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
}

impl AppState {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }

    /// The state store, or a declared configuration error when the broker
    /// was built without one.
    pub fn state_store(&self) -> ApiResult<&Arc<dyn StateStore>> {
        self.broker
            .state_store()
            .ok_or_else(|| ApiError::bad_request("no state store configured"))
    }
}
