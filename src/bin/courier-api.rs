//! Operational API server: wires config, logging, a state store and the
//! broker, then serves the HTTP surface.

use anyhow::Result;
use courier_core::broker::Broker;
use courier_core::config::CourierConfig;
use courier_core::logging::init_structured_logging;
use courier_core::state::backends::{InMemoryStateStore, PostgresStateStore};
use courier_core::state::middleware::MessageStateMiddleware;
use courier_core::state::store::StateStore;
use courier_core::web::{self, state::AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_structured_logging();
    let config = CourierConfig::from_env()?;

    let store: Arc<dyn StateStore> = match &config.database_url {
        Some(url) => {
            info!("using postgres state store");
            Arc::new(PostgresStateStore::connect(url).await?)
        }
        None => {
            info!("no DATABASE_URL set, using in-memory state store");
            Arc::new(InMemoryStateStore::new())
        }
    };

    let broker = Arc::new(
        Broker::builder()
            .middleware(Arc::new(MessageStateMiddleware::new(
                store.clone(),
                Some(config.state_ttl_seconds),
            )))
            .state_store(store)
            .build(),
    );
    broker.emit_after_process_boot().await;

    let app = web::router(AppState::new(broker));
    let listener = tokio::net::TcpListener::bind(&config.api_bind_address).await?;
    info!(address = %config.api_bind_address, "courier api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
