//! Postgres state store integration tests. These need a reachable
//! database and are ignored by default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/courier_test cargo test -- --ignored
//! ```

use chrono::Utc;
use courier_core::message::{Message, OptionsMap};
use courier_core::state::backends::PostgresStateStore;
use courier_core::state::filter::StateFilter;
use courier_core::state::store::StateStore;
use courier_core::state::{State, StateStatus};
use serde_json::json;

async fn connect() -> PostgresStateStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    PostgresStateStore::connect(&url)
        .await
        .expect("failed to connect to postgres")
}

fn pending_state(actor: &str) -> State {
    let message = Message::new(actor, vec![json!("payload")], OptionsMap::new(), OptionsMap::new());
    State::snapshot(&message, StateStatus::Pending).with_enqueued_datetime(Utc::now())
}

#[tokio::test]
#[ignore]
async fn test_postgres_round_trip_merge_and_ttl() {
    let store = connect().await;
    let state = pending_state("pg_actor").with_priority(Some(4));
    let id = state.message_id.clone();
    store.set_state(state.clone(), 60).await.unwrap();

    // Later write without priority keeps the stored one.
    let mut update = state.clone();
    update.status = StateStatus::Started;
    update.priority = None;
    update.enqueued_datetime = None;
    update.started_datetime = Some(Utc::now());
    store.set_state(update, 60).await.unwrap();

    let stored = store.get_state(&id).await.unwrap().unwrap();
    assert_eq!(stored.status, StateStatus::Started);
    assert_eq!(stored.priority, Some(4));
    assert!(stored.enqueued_datetime.is_some());

    // An expired write is immediately invisible.
    let expired = pending_state("pg_actor");
    let expired_id = expired.message_id.clone();
    store.set_state(expired, -1).await.unwrap();
    assert_eq!(store.get_state(&expired_id).await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn test_postgres_supports_filtered_clean() {
    let store = connect().await;
    assert!(store.supports_clean());

    let keep = pending_state("keep_me");
    let drop = pending_state("sweep_me");
    let keep_id = keep.message_id.clone();
    let drop_id = drop.message_id.clone();
    store.set_state(keep, 60).await.unwrap();
    store.set_state(drop, 60).await.unwrap();

    let removed = store
        .clean(&StateFilter::default().with_search("sweep_me"))
        .await
        .unwrap();
    assert!(removed >= 1);
    assert!(store.get_state(&keep_id).await.unwrap().is_some());
    assert_eq!(store.get_state(&drop_id).await.unwrap(), None);
}
