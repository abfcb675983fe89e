//! # Result Access Layer
//!
//! Bounded-size, failure-classified retrieval of a message's computed
//! output from an external result backend. Retrieval never consumes the
//! result; the classification distinguishes "never produced or expired",
//! "no backend configured" and "stored but not encodable for transport".

use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// Encoded results at or above this size are replaced by a placeholder;
/// the API exists for operational inspection, not bulk data transfer.
pub const MAX_ENCODED_RESULT_BYTES: usize = 10_000;

/// External storage for computed job outputs, keyed by message id.
/// Values are opaque encoded bytes; `None` means missing or expired.
#[async_trait]
pub trait ResultBackend: Send + Sync {
    async fn get_result(&self, message_id: &str) -> Result<Option<Vec<u8>>>;
}

/// Classified outcome of a result fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedResult {
    /// The decoded payload, under the size bound.
    Payload(String),
    /// Present but too large to transmit verbatim.
    TooLarge { size_bytes: usize },
    /// Never produced, or already expired.
    Missing,
    /// No result backend configured; an expected condition, not an error.
    NoBackend,
    /// The stored bytes cannot be decoded for transport.
    NonSerializable,
}

impl EncodedResult {
    /// Human-readable rendering used by the API surface.
    pub fn into_display_string(self) -> String {
        match self {
            Self::Payload(payload) => payload,
            Self::TooLarge { size_bytes } => {
                format!("The result is too big {}M", size_bytes as f64 / 1e6)
            }
            Self::Missing => "result is missing".to_string(),
            Self::NoBackend => "no result backend".to_string(),
            Self::NonSerializable => "non serializable result".to_string(),
        }
    }
}

/// Fetch and classify one message's result.
pub async fn encoded_result(
    backend: Option<&Arc<dyn ResultBackend>>,
    message_id: &str,
) -> Result<EncodedResult> {
    let Some(backend) = backend else {
        return Ok(EncodedResult::NoBackend);
    };
    let Some(bytes) = backend.get_result(message_id).await? else {
        return Ok(EncodedResult::Missing);
    };
    let size_bytes = bytes.len();
    match String::from_utf8(bytes) {
        Err(_) => Ok(EncodedResult::NonSerializable),
        Ok(_) if size_bytes >= MAX_ENCODED_RESULT_BYTES => {
            Ok(EncodedResult::TooLarge { size_bytes })
        }
        Ok(payload) => Ok(EncodedResult::Payload(payload)),
    }
}

/// Process-local result backend for tests and embedded brokers.
#[derive(Debug, Default)]
pub struct InMemoryResultBackend {
    results: DashMap<String, Vec<u8>>,
}

impl InMemoryResultBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_bytes(&self, message_id: impl Into<String>, bytes: Vec<u8>) {
        self.results.insert(message_id.into(), bytes);
    }

    /// Store a JSON value in its encoded form.
    pub fn store_value(&self, message_id: impl Into<String>, value: &Value) -> Result<()> {
        let encoded = serde_json::to_vec(value)?;
        self.results.insert(message_id.into(), encoded);
        Ok(())
    }
}

#[async_trait]
impl ResultBackend for InMemoryResultBackend {
    async fn get_result(&self, message_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.results.get(message_id).map(|bytes| bytes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend_with(message_id: &str, bytes: Vec<u8>) -> Arc<dyn ResultBackend> {
        let backend = InMemoryResultBackend::new();
        backend.store_bytes(message_id, bytes);
        Arc::new(backend)
    }

    #[tokio::test]
    async fn test_no_backend_classification() {
        assert_eq!(encoded_result(None, "m1").await.unwrap(), EncodedResult::NoBackend);
    }

    #[tokio::test]
    async fn test_missing_classification() {
        let backend: Arc<dyn ResultBackend> = Arc::new(InMemoryResultBackend::new());
        assert_eq!(
            encoded_result(Some(&backend), "m1").await.unwrap(),
            EncodedResult::Missing
        );
    }

    #[tokio::test]
    async fn test_payload_under_bound_returned_verbatim() {
        let backend = InMemoryResultBackend::new();
        backend.store_value("m1", &json!({"ok": true})).unwrap();
        let backend: Arc<dyn ResultBackend> = Arc::new(backend);
        assert_eq!(
            encoded_result(Some(&backend), "m1").await.unwrap(),
            EncodedResult::Payload("{\"ok\":true}".to_string())
        );
    }

    #[tokio::test]
    async fn test_oversized_payload_replaced_by_placeholder() {
        let big = "x".repeat(MAX_ENCODED_RESULT_BYTES);
        let backend = backend_with("m1", big.into_bytes());
        let result = encoded_result(Some(&backend), "m1").await.unwrap();
        assert_eq!(result, EncodedResult::TooLarge { size_bytes: 10_000 });
        // The placeholder reports the size in megabytes.
        assert_eq!(result.into_display_string(), "The result is too big 0.01M");
    }

    #[tokio::test]
    async fn test_undecodable_bytes_classified_non_serializable() {
        let backend = backend_with("m1", vec![0xff, 0xfe, 0xfd]);
        assert_eq!(
            encoded_result(Some(&backend), "m1").await.unwrap(),
            EncodedResult::NonSerializable
        );
    }
}
