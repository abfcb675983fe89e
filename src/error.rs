//! # Error Types
//!
//! Structured error handling for the courier core using thiserror. The
//! variants follow the taxonomy the rest of the crate relies on: domain
//! errors are recoverable and carry a specific reason, configuration
//! problems are user-facing conditions, and anything else is internal.

use thiserror::Error;

/// Errors produced by the courier core.
#[derive(Debug, Error)]
pub enum CourierError {
    /// A message referenced an actor that was never declared.
    #[error("unknown actor: {0}")]
    UnknownActor(String),

    /// No state record is addressable by the given message id.
    #[error("message_id = {0} does not exist")]
    MessageNotFound(String),

    /// The message is a pipeline stage; re-running it in isolation would
    /// break the pipeline's ordering guarantee.
    #[error("requeuing a message that is part of a pipeline is not supported")]
    PipelineRequeue,

    /// The backing store cannot perform the requested operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A state store query or write failed.
    #[error("database error: {0}")]
    Database(String),

    /// Invalid or missing runtime configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unanticipated failure; fatal for the current request only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CourierError {
    fn from(error: sqlx::Error) -> Self {
        CourierError::Database(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;
