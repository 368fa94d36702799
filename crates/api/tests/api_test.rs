use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use relay_api::{create_app, create_routes, AppState};
use relay_config::ApiConfig;
use relay_dispatcher::{
    test_utils::{MockStore, ProviderBehavior, RecordingChannel, ScriptedProvider},
    DispatchOrchestrator, EndpointFailoverResolver, GatedFanoutDispatcher, NotificationComposer,
};
use relay_domain::{ErrorKind, ResponseProvider, CHAT_COLLECTION, CONTACT_COLLECTION};

struct TestApp {
    router: Router,
    orchestrator: Arc<DispatchOrchestrator>,
    channel: Arc<RecordingChannel>,
    store: Arc<MockStore>,
}

fn build_app(
    providers: Vec<Arc<dyn ResponseProvider>>,
    channel: RecordingChannel,
    store: MockStore,
    admins: &[&str],
) -> TestApp {
    build_app_with_timeouts(
        providers,
        channel,
        store,
        admins,
        Duration::from_millis(500),
        Duration::from_millis(500),
    )
}

fn build_app_with_timeouts(
    providers: Vec<Arc<dyn ResponseProvider>>,
    channel: RecordingChannel,
    store: MockStore,
    admins: &[&str],
    attempt_timeout: Duration,
    send_timeout: Duration,
) -> TestApp {
    let channel = Arc::new(channel);
    let store = Arc::new(store);
    let resolver = Arc::new(EndpointFailoverResolver::new(providers, attempt_timeout).unwrap());
    let dispatcher = Arc::new(GatedFanoutDispatcher::new(channel.clone(), send_timeout));
    let orchestrator = Arc::new(DispatchOrchestrator::new(
        resolver,
        dispatcher,
        store.clone(),
        NotificationComposer::new("The Samurai"),
        admins.iter().map(|a| a.to_string()).collect(),
    ));

    TestApp {
        router: create_routes(AppState::new(orchestrator.clone())),
        orchestrator,
        channel,
        store,
    }
}

fn stalled_provider(id: &str, priority: u32) -> Arc<dyn ResponseProvider> {
    Arc::new(ScriptedProvider::new(
        id,
        priority,
        ProviderBehavior::Stall(Duration::from_secs(5)),
    ))
}

fn short_timeout_config() -> ApiConfig {
    ApiConfig {
        request_timeout_seconds: 1,
        ..ApiConfig::default()
    }
}

fn replying_provider(id: &str, priority: u32, text: &str) -> Arc<dyn ResponseProvider> {
    Arc::new(ScriptedProvider::new(
        id,
        priority,
        ProviderBehavior::Reply(text.to_string()),
    ))
}

fn failing_provider(id: &str, priority: u32, kind: ErrorKind) -> Arc<dyn ResponseProvider> {
    Arc::new(ScriptedProvider::new(id, priority, ProviderBehavior::Fail(kind)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_contact() -> Value {
    json!({
        "name": "Omar Saleh",
        "email": "Omar@Example.com",
        "phone": "+1 (555) 010-2030",
        "subject": "Security audit",
        "message": "We would like a quote for an audit.",
        "locale": "en"
    })
}

async fn wait_for_records(store: &MockStore, collection: &str, expected: usize) -> Vec<Value> {
    for _ in 0..50 {
        let records = store.records(collection);
        if records.len() >= expected {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.records(collection)
}

#[tokio::test]
async fn test_health_check() {
    let app = build_app(
        vec![replying_provider("primary-model", 1, "hello")],
        RecordingChannel::new(),
        MockStore::new(),
        &["admin@example.com"],
    );

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["endpoints"], json!(["primary-model"]));
    assert_eq!(body["adminRecipients"], 1);
}

#[tokio::test]
async fn test_chat_returns_first_successful_endpoint() {
    let app = build_app(
        vec![
            failing_provider("flash", 1, ErrorKind::NonSuccessStatus),
            replying_provider("flash-lite", 2, "We offer penetration testing."),
        ],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );

    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("user-agent", "integration-test")
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.2")
        .body(Body::from(
            json!({"message": "  What services do you offer?  ", "sessionId": "s-1"}).to_string(),
        ))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "We offer penetration testing.");
    assert_eq!(body["source"], "endpoint:flash-lite");
    assert_eq!(body["sessionId"], "s-1");
    assert!(body["timestamp"].is_string());

    let records = wait_for_records(&app.store, CHAT_COLLECTION, 1).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["message"], "What services do you offer?");
    assert_eq!(records[0]["user_agent"], "integration-test");
    assert_eq!(records[0]["ip_address"], "198.51.100.4");
}

#[tokio::test]
async fn test_chat_falls_back_when_every_endpoint_fails() {
    let app = build_app(
        vec![
            failing_provider("a", 1, ErrorKind::Timeout),
            failing_provider("b", 2, ErrorKind::Transport),
        ],
        RecordingChannel::new(),
        MockStore::failing(),
        &[],
    );

    let response = app
        .router
        .oneshot(post_json("/chat", json!({"text": "hello", "locale": "ar"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["source"], "fallback");
    assert!(!body["response"].as_str().unwrap().is_empty());
    assert!(!body["sessionId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_rejects_blank_message() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );

    let response = app
        .router
        .oneshot(post_json("/chat", json!({"message": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"]["message"], "Message is required");
    assert_eq!(body["error"]["type"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["code"], 400);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );

    let request = Request::builder()
        .method("POST")
        .uri("/contact")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"]["type"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_chat_history_requires_session_id() {
    let app = build_app(
        vec![replying_provider("a", 1, "hi")],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );

    let response = app
        .router
        .oneshot(Request::builder().uri("/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"]["message"], "Session ID is required");
}

#[tokio::test]
async fn test_chat_history_lists_session_messages() {
    let app = build_app(
        vec![replying_provider("a", 1, "answer")],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );

    for text in ["first question", "second question"] {
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/chat",
                json!({"message": text, "sessionId": "history-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        wait_for_records(&app.store, CHAT_COLLECTION, 1).await;
    }
    wait_for_records(&app.store, CHAT_COLLECTION, 2).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/chat?sessionId=history-1&limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["message"], "first question");
    assert_eq!(body["data"][1]["message"], "second question");
    assert_eq!(body["data"][0]["source"], "endpoint:a");
}

#[tokio::test]
async fn test_contact_submission_accepted_with_notifications() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::new(),
        &["admin@example.com", "ops@example.com"],
    );

    let response = app
        .router
        .oneshot(post_json("/contact", valid_contact()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["accepted"], true);
    assert_eq!(body["notificationsSent"], true);
    assert!(!body["contactId"].as_str().unwrap().is_empty());
    assert_eq!(body["deliveries"]["primary"]["address"], "omar@example.com");
    assert_eq!(body["deliveries"]["primary"]["role"], "primary");
    assert_eq!(body["deliveries"]["secondary"].as_array().unwrap().len(), 2);

    let contacts = app.store.records(CONTACT_COLLECTION);
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0]["status"], "new");
    assert_eq!(app.channel.sent().len(), 3);
}

#[tokio::test]
async fn test_contact_primary_failure_skips_admins() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new().failing_for("omar@example.com", ErrorKind::NonSuccessStatus),
        MockStore::new(),
        &["admin@example.com"],
    );

    let response = app
        .router
        .oneshot(post_json("/contact", valid_contact()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["notificationsSent"], false);
    assert_eq!(body["deliveries"]["primary"]["succeeded"], false);
    assert_eq!(body["deliveries"]["primary"]["errorKind"], "NonSuccessStatus");
    assert!(body["deliveries"]["secondary"].as_array().unwrap().is_empty());
    assert_eq!(app.channel.attempts(), vec!["omar@example.com".to_string()]);
}

#[tokio::test]
async fn test_contact_validation_error() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::new(),
        &["admin@example.com"],
    );

    let mut contact = valid_contact();
    contact["email"] = json!("not-an-email");

    let response = app
        .router
        .oneshot(post_json("/contact", contact))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"]["message"], "Invalid email format");
    assert!(app.store.records(CONTACT_COLLECTION).is_empty());
    assert!(app.channel.attempts().is_empty());
}

#[tokio::test]
async fn test_contact_persistence_failure_is_server_error() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::failing(),
        &["admin@example.com"],
    );

    let response = app
        .router
        .oneshot(post_json("/contact", valid_contact()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"]["type"], "PERSISTENCE_ERROR");
    assert!(app.channel.attempts().is_empty());
}

#[tokio::test]
async fn test_create_app_applies_cors() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
    );
    let router = create_app(AppState::new(app.orchestrator.clone()), &ApiConfig::default());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn test_health_reports_unavailable_store() {
    let app = build_app(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new(),
        MockStore::failing(),
        &[],
    );

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn test_slow_chat_resolution_outlives_request_timeout() {
    let app = build_app_with_timeouts(
        vec![stalled_provider("a", 1), stalled_provider("b", 2), stalled_provider("c", 3)],
        RecordingChannel::new(),
        MockStore::new(),
        &[],
        Duration::from_millis(500),
        Duration::from_millis(500),
    );
    let router = create_app(AppState::new(app.orchestrator.clone()), &short_timeout_config());

    let response = router
        .oneshot(post_json("/chat", json!({"message": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["source"], "fallback");
}

#[tokio::test]
async fn test_slow_contact_dispatch_outlives_request_timeout() {
    let app = build_app_with_timeouts(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new()
            .delayed_for("omar@example.com", Duration::from_millis(700))
            .delayed_for("admin@example.com", Duration::from_millis(700)),
        MockStore::new(),
        &["admin@example.com"],
        Duration::from_millis(500),
        Duration::from_millis(900),
    );
    let router = create_app(AppState::new(app.orchestrator.clone()), &short_timeout_config());

    let response = router
        .oneshot(post_json("/contact", valid_contact()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(body["notificationsSent"], true);
    assert_eq!(app.store.records(CONTACT_COLLECTION).len(), 1);
    assert_eq!(app.channel.sent().len(), 2);
}

#[tokio::test]
async fn test_dropped_contact_request_still_notifies_admins() {
    let app = build_app_with_timeouts(
        vec![replying_provider("a", 1, "unused")],
        RecordingChannel::new().delayed_for("omar@example.com", Duration::from_millis(300)),
        MockStore::new(),
        &["admin@example.com"],
        Duration::from_millis(500),
        Duration::from_secs(2),
    );

    let request = tokio::spawn(app.router.clone().oneshot(post_json("/contact", valid_contact())));
    tokio::time::sleep(Duration::from_millis(100)).await;
    request.abort();

    let mut delivered = Vec::new();
    for _ in 0..100 {
        delivered = app.channel.sent();
        if delivered.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let addresses: Vec<&str> = delivered.iter().map(|(address, _)| address.as_str()).collect();
    assert_eq!(addresses, vec!["omar@example.com", "admin@example.com"]);
    assert_eq!(app.store.records(CONTACT_COLLECTION).len(), 1);
}
