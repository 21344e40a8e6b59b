//! HTTP-level tests for the chat-relay router.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use chat_relay_backend::test_util::{test_config, test_state, FakeConnector, FakeReply};
use chat_relay_backend::{app, AppState, Config, UpstreamKind};
use chat_relay_common::{ChatResponse, HealthResponse, ModelsResponse};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn fake_app(reply: FakeReply) -> (Router, Arc<FakeConnector>) {
    let connector = Arc::new(FakeConnector::replying(reply));
    let state = test_state(test_config(), connector.clone());
    (app(state), connector)
}

#[tokio::test]
async fn test_health_reports_configured() {
    let (app, _) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.configured);
}

#[tokio::test]
async fn test_health_reports_unconfigured() {
    let state = test_state(test_config(), Arc::new(FakeConnector::unconfigured()));
    let (status, body) = send(&app(state), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "configured": false}));
}

#[tokio::test]
async fn test_list_models() {
    let (app, connector) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(&app, Method::GET, "/api/models", None).await;

    assert_eq!(status, StatusCode::OK);
    let models: ModelsResponse = serde_json::from_value(body).unwrap();
    assert_eq!(models.default_model, "gpt-3.5-turbo");
    assert!(models.models.iter().all(|m| m.max_tokens > 0));
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_chat_success() {
    let (app, connector) = fake_app(FakeReply::text("Paris", Some(12)));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": "What is the capital of France?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: ChatResponse = serde_json::from_value(body).unwrap();
    assert_eq!(reply.message, "Paris");
    assert_eq!(reply.tokens_used, 12);
    assert_eq!(reply.model, "gpt-3.5-turbo");
    assert!(reply.timestamp.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&reply.timestamp).is_ok());
    assert_eq!(connector.calls(), 1);
}

#[tokio::test]
async fn test_chat_passes_history_and_overrides() {
    let (app, connector) = fake_app(FakeReply::text("Berlin", Some(20)));
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({
            "message": "And Germany?",
            "history": [
                {"role": "user", "content": "What is the capital of France?"},
                {"role": "assistant", "content": "Paris"}
            ],
            "model": "gpt-4",
            "temperature": 0.2,
            "max_tokens": 64
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = connector.last_request().unwrap();
    assert_eq!(sent.model, "gpt-4");
    assert_eq!(sent.temperature, 0.2);
    assert_eq!(sent.max_tokens, 64);
    let contents: Vec<&str> = sent.messages.iter().map(|t| t.content()).collect();
    assert_eq!(
        contents[1..],
        ["What is the capital of France?", "Paris", "And Germany?"]
    );
}

#[tokio::test]
async fn test_chat_invalid_temperature_is_bad_request() {
    let (app, connector) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": "Hi", "temperature": 2.5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_parameter");
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_chat_temperature_just_above_limit_is_bad_request() {
    let (app, connector) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": "Hi", "temperature": 2.00000001})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_parameter");
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_chat_max_tokens_above_ceiling_is_bad_request() {
    let (app, connector) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": "Hi", "model": "gpt-3.5-turbo", "max_tokens": 5000})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("max_tokens"));
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_chat_bad_history_role_is_bad_request() {
    let (app, connector) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({"message": "Hi", "history": [{"role": "tool", "content": "x"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_parameter");
    assert_eq!(connector.calls(), 0);
}

#[tokio::test]
async fn test_chat_malformed_body_is_bad_request() {
    let (app, _) = fake_app(FakeReply::text("unused", None));
    let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({"history": []}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_parameter");
}

#[tokio::test]
async fn test_chat_not_configured() {
    let state = test_state(test_config(), Arc::new(FakeConnector::unconfigured()));
    let (status, body) = send(
        &app(state),
        Method::POST,
        "/api/chat",
        Some(json!({"message": "Hi", "temperature": 9.0})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "not_configured");
}

#[tokio::test]
async fn test_chat_upstream_failure_is_bad_gateway() {
    let (app, _) = fake_app(FakeReply::Fail(UpstreamKind::RateLimited));
    let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({"message": "Hi"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["type"], "upstream_error");
    assert_eq!(body["error"]["kind"], "rate_limited");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (app, _) = fake_app(FakeReply::text("unused", None));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

fn upstream_config(base_url: &str) -> Config {
    let mut config = test_config();
    config.provider.base_url = base_url.to_string();
    config.provider.api_key = Some("sk-e2e".to_string());
    config
}

#[tokio::test]
async fn test_chat_against_mock_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-e2e"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo", "max_tokens": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Paris"}}],
            "usage": {"total_tokens": 12}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = Arc::new(AppState::new(upstream_config(&server.uri())));
    let (status, body) = send(
        &app(state),
        Method::POST,
        "/api/chat",
        Some(json!({"message": "What is the capital of France?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Paris");
    assert_eq!(body["tokens_used"], 12);
    assert_eq!(body["model"], "gpt-3.5-turbo-0125");
}

#[tokio::test]
async fn test_chat_provider_rejection_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let state = Arc::new(AppState::new(upstream_config(&server.uri())));
    let (status, body) = send(&app(state), Method::POST, "/api/chat", Some(json!({"message": "Hi"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["kind"], "authentication");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_real_connector_without_key_is_not_configured() {
    let mut config = test_config();
    config.provider.api_key = None;
    let state = Arc::new(AppState::new(config));

    let (_, health) = send(&app(state.clone()), Method::GET, "/health", None).await;
    assert_eq!(health["configured"], false);

    let (status, _) = send(&app(state), Method::POST, "/api/chat", Some(json!({"message": "Hi"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
