use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sitesmith::api::AppState;
use sitesmith::clients::completion::{ChatMessage, CompletionBackend, CompletionError};
use sitesmith::config::Config;
use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20260301_initial.rs)
const DEFAULT_API_KEY: &str = "sitesmith_default_api_key_please_regenerate";

const VALID_REPLY: &str =
    r#"{"message":"Here you go","action":"UPDATE_DOCUMENT","document":"<p>hi</p>"}"#;

/// Scripted upstream. Pops one queued response per call and records what
/// was sent.
struct FakeBackend {
    responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: AtomicUsize,
    last_model: Mutex<Option<String>>,
    last_first_role: Mutex<Option<String>>,
}

impl FakeBackend {
    fn new(responses: Vec<Result<String, CompletionError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            last_model: Mutex::new(None),
            last_first_role: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_model.lock().unwrap() = Some(model.to_string());
        *self.last_first_role.lock().unwrap() = messages.first().map(|m| m.role.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(CompletionError::Transport(
                "no scripted response".to_string(),
            )))
    }
}

async fn spawn_app(backend: Arc<FakeBackend>) -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = sitesmith::api::create_app_state_with_backend(config, None, backend)
        .await
        .expect("Failed to create app state");
    (sitesmith::api::router(state.clone()).await, state)
}

fn chat_request(api_key: Option<&str>) -> Request<Body> {
    let body = r#"{
        "messages": [{"role": "user", "content": "Write about quantum entanglement"}],
        "mode": "article",
        "currentContext": {"title": "Quantum", "html": "<p>old</p>"}
    }"#;

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/copilot/chat")
        .header("Content-Type", "application/json");

    if let Some(key) = api_key {
        builder = builder.header("X-Api-Key", key);
    }

    builder.body(Body::from(body)).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn owner_id(state: &AppState) -> i32 {
    state
        .store()
        .get_account_by_email("owner@localhost")
        .await
        .unwrap()
        .unwrap()
        .id
}

#[tokio::test]
async fn test_chat_without_identity_is_rejected_before_ledger() {
    let backend = FakeBackend::new(vec![Ok(VALID_REPLY.to_string())]);
    let (app, _state) = spawn_app(backend.clone()).await;

    let response = app.oneshot(chat_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["action"], "NONE");
    assert!(json["message"].as_str().unwrap().contains("Sign in"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_exhausted_account_gets_out_of_fuel() {
    let backend = FakeBackend::new(vec![Ok(VALID_REPLY.to_string())]);
    let (app, state) = spawn_app(backend.clone()).await;

    let id = owner_id(&state).await;
    state.store().set_account_credits(id, 0).await.unwrap();

    let response = app
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    let json = body_json(response).await;
    assert_eq!(json["action"], "OUT_OF_FUEL");
    assert!(json["message"].as_str().unwrap().contains("out of fuel"));

    // The upstream was never dispatched.
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_successful_chat_debits_exactly_one_credit() {
    let backend = FakeBackend::new(vec![Ok(VALID_REPLY.to_string())]);
    let (app, state) = spawn_app(backend.clone()).await;

    let id = owner_id(&state).await;
    state.store().set_account_credits(id, 5).await.unwrap();

    let response = app
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Here you go");
    assert_eq!(json["action"], "UPDATE_DOCUMENT");
    assert_eq!(json["document"], "<p>hi</p>");

    assert_eq!(backend.calls(), 1);
    // The configured default model is used and the assembled system prompt
    // leads the message list.
    assert_eq!(
        backend.last_model.lock().unwrap().as_deref(),
        Some("gpt-4o-mini")
    );
    assert_eq!(
        backend.last_first_role.lock().unwrap().as_deref(),
        Some("system")
    );

    let credits = state.store().account_credits(id).await.unwrap().unwrap();
    assert_eq!(credits, 4);
}

#[tokio::test]
async fn test_last_credit_is_spendable_then_out_of_fuel() {
    let backend = FakeBackend::new(vec![
        Ok(VALID_REPLY.to_string()),
        Ok(VALID_REPLY.to_string()),
    ]);
    let (app, state) = spawn_app(backend.clone()).await;

    let id = owner_id(&state).await;
    state.store().set_account_credits(id, 1).await.unwrap();

    let response = app
        .clone()
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let credits = state.store().account_credits(id).await.unwrap().unwrap();
    assert_eq!(credits, 0);

    let response = app
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_upstream_failure_surfaces_without_debit() {
    let backend = FakeBackend::new(vec![Err(CompletionError::Status {
        status: 502,
        body: "upstream exploded".to_string(),
    })]);
    let (app, state) = spawn_app(backend.clone()).await;

    let id = owner_id(&state).await;
    state.store().set_account_credits(id, 5).await.unwrap();

    let response = app
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["action"], "NONE");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("upstream exploded")
    );

    let credits = state.store().account_credits(id).await.unwrap().unwrap();
    assert_eq!(credits, 5);
}

#[tokio::test]
async fn test_malformed_reply_is_an_upstream_failure() {
    let backend = FakeBackend::new(vec![Ok("```json\n{}\n```".to_string())]);
    let (app, state) = spawn_app(backend.clone()).await;

    let id = owner_id(&state).await;
    state.store().set_account_credits(id, 5).await.unwrap();

    let response = app
        .oneshot(chat_request(Some(DEFAULT_API_KEY)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["action"], "NONE");

    let credits = state.store().account_credits(id).await.unwrap().unwrap();
    assert_eq!(credits, 5);
}

#[tokio::test]
async fn test_model_override_is_forwarded() {
    let backend = FakeBackend::new(vec![Ok(VALID_REPLY.to_string())]);
    let (app, _state) = spawn_app(backend.clone()).await;

    let body = r#"{
        "messages": [{"role": "user", "content": "hello"}],
        "model": "gpt-4o",
        "mode": "coder",
        "currentContext": {"files": {"index.html": "<html></html>"}}
    }"#;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/copilot/chat")
                .header("Content-Type", "application/json")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.last_model.lock().unwrap().as_deref(), Some("gpt-4o"));
}
