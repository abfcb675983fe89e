//! Operational API tests driven through the router with oneshot calls.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use courier_core::broker::Broker;
use courier_core::composition::pipeline;
use courier_core::message::OptionsMap;
use courier_core::middleware::Middleware;
use courier_core::results::{InMemoryResultBackend, MAX_ENCODED_RESULT_BYTES};
use courier_core::scheduler::{LocalScheduler, ScheduledJob};
use courier_core::state::backends::InMemoryStateStore;
use courier_core::state::middleware::MessageStateMiddleware;
use courier_core::web::{self, state::AppState};
use courier_core::Actor;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Declares `time_limit` as an actor-level option for the /options test.
struct TimeLimitMiddleware;

#[async_trait]
impl Middleware for TimeLimitMiddleware {
    fn actor_options(&self) -> &[&str] {
        &["time_limit"]
    }
}

struct TestApp {
    broker: Arc<Broker>,
    router: Router,
}

impl TestApp {
    async fn with_broker(broker: Broker) -> Self {
        let broker = Arc::new(broker);
        broker
            .declare_actor(Actor::from_fn("send_email", |_, _| Ok(json!("sent"))))
            .await
            .unwrap();
        let router = web::router(AppState::new(broker.clone()));
        Self { broker, router }
    }

    async fn new() -> Self {
        let store = Arc::new(InMemoryStateStore::new());
        let broker = Broker::builder()
            .middleware(Arc::new(TimeLimitMiddleware))
            .middleware(Arc::new(MessageStateMiddleware::new(store.clone(), Some(3600))))
            .state_store(store)
            .build();
        Self::with_broker(broker).await
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(value) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    async fn enqueue(&self, args: Value) -> String {
        let (status, body) = self
            .post("/messages", json!({"actor_name": "send_email", "args": args}))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["message_id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert!(body.get("timestamp").is_some());
}

#[tokio::test]
async fn test_enqueue_then_list_states() {
    let app = TestApp::new().await;
    let message_id = app.enqueue(json!(["ops@example.com"])).await;

    let (status, body) = app.post("/messages/states", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["data"][0]["message_id"], json!(message_id));
    assert_eq!(body["data"][0]["status"], json!("pending"));
}

#[tokio::test]
async fn test_list_count_is_total_matching_not_page_length() {
    let app = TestApp::new().await;
    for i in 0..3 {
        app.enqueue(json!([i])).await;
    }

    let (status, body) = app
        .post("/messages/states", json!({"offset": 0, "size": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["count"], json!(3));
}

#[tokio::test]
async fn test_list_pagination_is_idempotent() {
    let app = TestApp::new().await;
    for i in 0..4 {
        app.enqueue(json!([i])).await;
    }
    let (_, first) = app
        .post("/messages/states", json!({"offset": 1, "size": 2}))
        .await;
    let (_, second) = app
        .post("/messages/states", json!({"offset": 1, "size": 2}))
        .await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_list_search_filters_by_substring() {
    let app = TestApp::new().await;
    app.enqueue(json!(["alice@example.com"])).await;
    app.enqueue(json!(["bob@example.com"])).await;

    let (status, body) = app
        .post("/messages/states", json!({"search_value": "ALICE"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));

    let (_, body) = app
        .post("/messages/states", json!({"search_value": "send_email"}))
        .await;
    assert_eq!(body["count"], json!(2));
}

#[tokio::test]
async fn test_oversized_page_size_is_a_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/messages/states", json!({"size": 100000})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["size"].as_str().unwrap().contains("at most"));
}

#[tokio::test]
async fn test_get_state_round_trip_and_not_found() {
    let app = TestApp::new().await;
    let message_id = app.enqueue(json!([1])).await;

    let (status, body) = app.get(&format!("/messages/state/{message_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actor_name"], json!("send_email"));

    let (status, body) = app.get("/messages/state/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn test_clean_states_is_a_declared_unsupported_operation() {
    // The in-memory store has no transactional bulk delete.
    let app = TestApp::new().await;
    let (status, body) = app
        .request(Method::DELETE, "/messages/states", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not supported"));
}

#[tokio::test]
async fn test_cancel_always_reports_success() {
    let app = TestApp::new().await;
    let (status, body) = app.post("/messages/cancel/anything", json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!("ok"));
}

#[tokio::test]
async fn test_requeue_standalone_message() {
    let app = TestApp::new().await;
    let message_id = app.enqueue(json!([5])).await;

    let (status, body) = app.get(&format!("/messages/requeue/{message_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!("ok"));
    assert_ne!(body["message_id"], json!(message_id));

    let (_, listing) = app.post("/messages/states", json!({})).await;
    assert_eq!(listing["count"], json!(2));
}

#[tokio::test]
async fn test_requeue_pipeline_stage_is_refused() {
    let app = TestApp::new().await;
    let first = app
        .broker
        .build_message("send_email", vec![], OptionsMap::new(), OptionsMap::new())
        .unwrap();
    let second = app
        .broker
        .build_message("send_email", vec![], OptionsMap::new(), OptionsMap::new())
        .unwrap();
    let head = pipeline(vec![first, second]).unwrap();
    app.broker.enqueue(&head, None).await.unwrap();

    let (status, body) = app
        .get(&format!("/messages/requeue/{}", head.message_id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("pipeline"));

    // Refusal means nothing new was enqueued.
    let (_, listing) = app.post("/messages/states", json!({})).await;
    assert_eq!(listing["count"], json!(1));
}

#[tokio::test]
async fn test_result_classifications() {
    // Without a backend the condition is informational, not an error.
    let app = TestApp::new().await;
    let (status, body) = app.get("/messages/result/m1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!("no result backend"));

    // With a backend: missing, payload, oversized.
    let results = Arc::new(InMemoryResultBackend::new());
    results.store_value("done", &json!({"total": 42})).unwrap();
    results.store_bytes("huge", "x".repeat(MAX_ENCODED_RESULT_BYTES).into_bytes());
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Broker::builder()
        .state_store(store)
        .result_backend(results)
        .build();
    let app = TestApp::with_broker(broker).await;

    let (_, body) = app.get("/messages/result/unknown").await;
    assert_eq!(body["result"], json!("result is missing"));

    let (_, body) = app.get("/messages/result/done").await;
    assert_eq!(body["result"], json!("{\"total\":42}"));

    let (_, body) = app.get("/messages/result/huge").await;
    let text = body["result"].as_str().unwrap();
    assert!(text.contains("too big"));
    assert!(text.contains("0.01M"));
}

#[tokio::test]
async fn test_scheduled_jobs_empty_without_scheduler() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/scheduled/jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!([]));
}

#[tokio::test]
async fn test_scheduled_jobs_listed_when_configured() {
    let scheduler = Arc::new(LocalScheduler::new());
    scheduler.add_job(ScheduledJob {
        actor_name: "send_email".to_string(),
        args: vec![],
        kwargs: OptionsMap::new(),
        interval_seconds: Some(300),
        enabled: true,
        last_queued: None,
    });
    let broker = Broker::builder()
        .state_store(Arc::new(InMemoryStateStore::new()))
        .scheduler(scheduler)
        .build();
    let app = TestApp::with_broker(broker).await;

    let (_, body) = app.get("/scheduled/jobs").await;
    assert_eq!(body["result"][0]["actor_name"], json!("send_email"));
    assert_eq!(body["result"][0]["interval_seconds"], json!(300));
}

#[tokio::test]
async fn test_actors_and_options_discovery() {
    let app = TestApp::new().await;
    let (_, body) = app.get("/actors").await;
    assert_eq!(body["result"][0]["name"], json!("send_email"));
    assert_eq!(body["result"][0]["queue_name"], json!("default"));

    let (_, body) = app.get("/options").await;
    assert_eq!(body["options"], json!(["time_limit"]));
}

#[tokio::test]
async fn test_enqueue_validation_and_unknown_actor() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/messages", json!({"actor_name": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["actor_name"].is_string());

    let (status, body) = app.post("/messages", json!({"actor_name": "ghost"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unknown actor"));
}

#[tokio::test]
async fn test_groups_listing_orders_and_counts() {
    let app = TestApp::new().await;

    // Two groups; the later-enqueued group must list first.
    for (group, arg) in [("g-early", 1), ("g-early", 2)] {
        let message = app
            .broker
            .build_message("send_email", vec![json!(arg)], OptionsMap::new(), OptionsMap::new())
            .unwrap()
            .with_option("group_info", json!({"group_id": group}));
        app.broker.enqueue(&message, None).await.unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let message = app
        .broker
        .build_message("send_email", vec![json!(3)], OptionsMap::new(), OptionsMap::new())
        .unwrap()
        .with_option("group_info", json!({"group_id": "g-late"}));
    app.broker.enqueue(&message, None).await.unwrap();
    // An ungrouped message never shows up in group views.
    app.enqueue(json!([4])).await;

    let (status, body) = app.post("/groups", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["data"][0]["group_id"], json!("g-late"));
    assert_eq!(body["data"][1]["group_id"], json!("g-early"));
    assert_eq!(body["data"][1]["messages"].as_array().unwrap().len(), 2);
    // Group member entries are trimmed views.
    assert!(body["data"][0]["messages"][0].get("args").is_none());

    // Pagination applies to groups, not messages.
    let (_, body) = app.post("/groups", json!({"offset": 1, "size": 1})).await;
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["group_id"], json!("g-early"));
}
