#![allow(dead_code)]

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::Json;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tensorlake_tools::{TensorlakeClient, TensorlakeConfig};

pub const TEST_API_KEY: &str = "tl_test_key";

/// How the fake service answers status polls.
#[derive(Debug, Clone, Copy)]
pub enum JobBehavior {
    /// Report `pending` this many times, then `successful`.
    SucceedAfter(usize),
    Fail,
    NeverFinish,
    /// Hold every status request this long, then report `processing`.
    SlowPoll(Duration),
    /// Succeed, but without any chunks.
    SucceedWithoutChunks,
}

#[derive(Clone)]
pub struct FakeTensorlake {
    pub behavior: JobBehavior,
    pub uploads: Arc<Mutex<Vec<String>>>,
    pub parse_requests: Arc<Mutex<Vec<Value>>>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    pub polls: Arc<AtomicUsize>,
}

impl FakeTensorlake {
    fn new(behavior: JobBehavior) -> Self {
        Self {
            behavior,
            uploads: Arc::default(),
            parse_requests: Arc::default(),
            auth_headers: Arc::default(),
            polls: Arc::default(),
        }
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().unwrap().push(auth);
    }

    pub fn parse_requests(&self) -> Vec<Value> {
        self.parse_requests.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

async fn upload(State(state): State<FakeTensorlake>, headers: HeaderMap, body: Bytes) -> Json<Value> {
    state.record_auth(&headers);
    let body = String::from_utf8_lossy(&body).to_string();
    let mut uploads = state.uploads.lock().unwrap();
    uploads.push(body);
    Json(json!({ "file_id": format!("file_{}", uploads.len()), "created_at": "2026-10-19T00:00:00Z" }))
}

async fn create_parse(
    State(state): State<FakeTensorlake>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.record_auth(&headers);
    state.parse_requests.lock().unwrap().push(body);
    Json(json!({ "parse_id": "parse_test", "created_at": "2026-10-19T00:00:00Z" }))
}

async fn get_parse(
    State(state): State<FakeTensorlake>,
    headers: HeaderMap,
    Path(parse_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    state.record_auth(&headers);
    if parse_id != "parse_test" {
        return Err(StatusCode::NOT_FOUND);
    }
    let poll = state.polls.fetch_add(1, Ordering::SeqCst) + 1;
    if let JobBehavior::SlowPoll(delay) = state.behavior {
        tokio::time::sleep(delay).await;
    }

    let body = match state.behavior {
        JobBehavior::SucceedAfter(pending) if poll <= pending => {
            let status = if poll == 1 { "pending" } else { "detecting_layout" };
            json!({ "parse_id": parse_id, "status": status })
        }
        JobBehavior::SucceedAfter(_) => json!({
            "parse_id": parse_id,
            "status": "successful",
            "total_pages": 2,
            "chunks": [
                { "page_number": 1, "content": "# Lease Agreement" },
                { "page_number": 2, "content": "Signed: Jane Doe" }
            ]
        }),
        JobBehavior::SucceedWithoutChunks => json!({
            "parse_id": parse_id,
            "status": "successful",
            "chunks": [],
            "structured_data": { "parties": ["Jane Doe"] }
        }),
        JobBehavior::Fail => json!({
            "parse_id": parse_id,
            "status": "failure",
            "error": "document is encrypted"
        }),
        JobBehavior::NeverFinish | JobBehavior::SlowPoll(_) => {
            json!({ "parse_id": parse_id, "status": "processing" })
        }
    };

    Ok(Json(body))
}

/// Start a fake DocumentAI service; returns its base URL and shared state.
pub async fn spawn_tensorlake(behavior: JobBehavior) -> (String, FakeTensorlake) {
    let state = FakeTensorlake::new(behavior);
    let app = Router::new()
        .route("/documents/v2/files", put(upload))
        .route("/documents/v2/parse", post(create_parse))
        .route("/documents/v2/parse/:parse_id", get(get_parse))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/documents/v2"), state)
}

pub fn test_config(base_url: &str) -> TensorlakeConfig {
    TensorlakeConfig {
        base_url: base_url.to_string(),
        api_key: Some(TEST_API_KEY.to_string()),
        request_timeout: 10,
        ..Default::default()
    }
}

pub fn test_client(base_url: &str) -> TensorlakeClient {
    TensorlakeClient::new(&test_config(base_url))
        .unwrap()
        .with_poll_interval(Duration::from_millis(20))
}

/// Scripted chat-completions endpoint: replies are served in order.
#[derive(Clone)]
pub struct FakeOpenAi {
    pub replies: Arc<Mutex<Vec<Value>>>,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl FakeOpenAi {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

async fn chat_completions(State(state): State<FakeOpenAi>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.lock().unwrap().push(body);
    let mut replies = state.replies.lock().unwrap();
    let message = if replies.is_empty() {
        json!({ "role": "assistant", "content": "no more scripted replies" })
    } else {
        replies.remove(0)
    };
    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
    }))
}

pub async fn spawn_openai(replies: Vec<Value>) -> (String, FakeOpenAi) {
    let state = FakeOpenAi {
        replies: Arc::new(Mutex::new(replies)),
        requests: Arc::default(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), state)
}
