//! # Runtime Configuration
//!
//! Environment-driven configuration for the courier core. Values come from
//! `COURIER_*` variables with sensible defaults; parse failures surface as
//! configuration errors rather than panics.

use crate::error::{CourierError, Result};

/// Runtime configuration for brokers and the operational API.
#[derive(Debug, Clone)]
pub struct CourierConfig {
    /// Postgres connection string for the durable state backend. When
    /// absent, the in-memory backend is used.
    pub database_url: Option<String>,
    /// Seconds a state snapshot survives in the store. Zero or negative
    /// disables state tracking entirely.
    pub state_ttl_seconds: i64,
    /// Bind address for the operational HTTP API.
    pub api_bind_address: String,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            state_ttl_seconds: 3600,
            api_bind_address: "127.0.0.1:5005".to_string(),
        }
    }
}

impl CourierConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = Some(url);
        }

        if let Ok(ttl) = std::env::var("COURIER_STATE_TTL") {
            config.state_ttl_seconds = ttl.parse().map_err(|e| {
                CourierError::Configuration(format!("invalid COURIER_STATE_TTL: {e}"))
            })?;
        }

        if let Ok(addr) = std::env::var("COURIER_API_BIND") {
            config.api_bind_address = addr;
        }

        Ok(config)
    }
}
