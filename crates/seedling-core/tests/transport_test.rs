//! OpenAI-compatible transport against a local mock endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, State};
use axum::http::header::{AUTHORIZATION, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};

use seedling_core::llm::{
    ChatRequest, ChatTransport, Completion, CompletionClient, Conversation, GenerationParams,
    LlmError, OpenAiTransport, RetryPolicy,
};

// ===========================================================================
// Mock endpoint
// ===========================================================================

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    replies: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
}

impl MockState {
    fn requests(&self) -> Vec<(Option<String>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn chat(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.requests.lock().unwrap().push((auth, body));

    let (status, body) = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "script exhausted".into()));
    let mut response = (status, body).into_response();
    if status == StatusCode::TOO_MANY_REQUESTS {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from_static("7"));
    }
    response
}

/// Start a mock endpoint replaying `replies`; returns its base URL.
async fn spawn_mock(replies: Vec<(StatusCode, String)>) -> (String, MockState) {
    let state = MockState::default();
    state.replies.lock().unwrap().extend(replies);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn ok_reply(content: &str) -> (StatusCode, String) {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    });
    (StatusCode::OK, body.to_string())
}

fn transport(base_url: &str) -> OpenAiTransport {
    OpenAiTransport::new("sk-test".into(), base_url.into(), Duration::from_secs(5)).unwrap()
}

fn conversation() -> Conversation {
    Conversation::new("you write code", "a counter app")
}

// ===========================================================================
// Transport
// ===========================================================================

#[tokio::test]
async fn sends_bearer_auth_and_request_shape() {
    let (base, mock) = spawn_mock(vec![ok_reply("hello")]).await;
    let params = GenerationParams::default();
    let conv = conversation();

    let reply = transport(&base)
        .send(&ChatRequest::new(&params, &conv))
        .await
        .unwrap();

    assert_eq!(reply, "hello");
    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 2000);
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "you write code");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "a counter app");
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let (base, mock) = spawn_mock(vec![ok_reply("ok")]).await;
    let params = GenerationParams::default();
    let conv = conversation();

    let reply = transport(&format!("{base}/"))
        .send(&ChatRequest::new(&params, &conv))
        .await
        .unwrap();

    assert_eq!(reply, "ok");
    assert_eq!(mock.requests().len(), 1);
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let (base, _mock) = spawn_mock(vec![(StatusCode::TOO_MANY_REQUESTS, "slow down".into())]).await;
    let params = GenerationParams::default();
    let conv = conversation();

    let err = transport(&base)
        .send(&ChatRequest::new(&params, &conv))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::RateLimited { retry_after: Some(7) }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unauthorized_is_fatal() {
    let (base, _mock) = spawn_mock(vec![(StatusCode::UNAUTHORIZED, "bad key".into())]).await;
    let params = GenerationParams::default();
    let conv = conversation();

    let err = transport(&base)
        .send(&ChatRequest::new(&params, &conv))
        .await
        .unwrap_err();

    match &err {
        LlmError::ApiError { status, message } => {
            assert_eq!(*status, 401);
            assert_eq!(message, "bad key");
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn reply_without_content_is_invalid() {
    let body = json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] });
    let (base, _mock) = spawn_mock(vec![(StatusCode::OK, body.to_string())]).await;
    let params = GenerationParams::default();
    let conv = conversation();

    let err = transport(&base)
        .send(&ChatRequest::new(&params, &conv))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn empty_api_key_is_rejected_up_front() {
    let err = OpenAiTransport::new("  ".into(), "http://localhost".into(), Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, LlmError::MissingApiKey(_)));
}

// ===========================================================================
// Client over HTTP
// ===========================================================================

#[tokio::test]
async fn client_retries_server_errors_with_identical_request() {
    let (base, mock) = spawn_mock(vec![
        (StatusCode::SERVICE_UNAVAILABLE, "overloaded".into()),
        (StatusCode::TOO_MANY_REQUESTS, "slow down".into()),
        ok_reply("finally"),
    ])
    .await;
    let client = CompletionClient::new(
        transport(&base),
        GenerationParams::default(),
        RetryPolicy::immediate(),
    );

    let reply = client.complete(&conversation()).await.unwrap();

    assert_eq!(reply, "finally");
    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].1, requests[1].1);
    assert_eq!(requests[1].1, requests[2].1);
}

#[tokio::test]
async fn client_does_not_retry_bad_request() {
    let (base, mock) = spawn_mock(vec![
        (StatusCode::BAD_REQUEST, "context length exceeded".into()),
        ok_reply("never reached"),
    ])
    .await;
    let client = CompletionClient::new(
        transport(&base),
        GenerationParams::default(),
        RetryPolicy::immediate(),
    );

    let err = client.complete(&conversation()).await.unwrap_err();

    assert!(matches!(err, LlmError::ApiError { status: 400, .. }));
    assert_eq!(mock.requests().len(), 1);
}
