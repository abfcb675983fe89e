//! # API Error Responses
//!
//! Maps the core error taxonomy onto HTTP: domain and validation errors
//! are specific 4xx responses with a reason, configuration conditions the
//! handlers choose to surface are 400s, anything unanticipated is a
//! generic 500. Every body is `{"error": ...}`.

use crate::error::CourierError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error shape returned by every API handler.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation { field: &'static str, message: String },
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            Self::Validation { field, message } => {
                let mut detail = serde_json::Map::new();
                detail.insert(field.to_string(), json!(message));
                (StatusCode::BAD_REQUEST, json!({ "error": detail }))
            }
            Self::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            Self::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<CourierError> for ApiError {
    fn from(error: CourierError) -> Self {
        match &error {
            CourierError::MessageNotFound(_) => Self::NotFound(error.to_string()),
            CourierError::UnknownActor(_)
            | CourierError::PipelineRequeue
            | CourierError::UnsupportedOperation(_)
            | CourierError::Configuration(_) => Self::BadRequest(error.to_string()),
            CourierError::Serialization(_)
            | CourierError::Database(_)
            | CourierError::Internal(_) => Self::Internal(error.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
