//! Test utilities for munger-core
//!
//! This module provides a mock Gemini server that speaks the
//! `generateContent` wire format, for integration tests and development.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// A request received by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Model name from the URL
    pub model: String,
    /// Value of the `x-goog-api-key` header
    pub api_key: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    /// Text of the first part
    pub fn prompt(&self) -> &str {
        self.body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
    }

    pub fn has_image(&self) -> bool {
        !self.body["contents"][0]["parts"][1]["inline_data"].is_null()
    }
}

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<(StatusCode, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock Gemini server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/v1beta/models", get(handle_list_models))
            .route("/v1beta/models/:call", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a successful reply with the given text
    pub fn push_text(&self, text: &str) {
        self.push_raw(200, candidate(text));
    }

    /// Queue an API error in Gemini's error format
    pub fn push_error(&self, status: u16, message: &str) {
        self.push_raw(
            status,
            json!({"error": {"code": status, "message": message, "status": "ERROR"}}),
        );
    }

    /// Queue an arbitrary status and body
    pub fn push_raw(&self, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.state.replies.lock().unwrap().push_back((status, body));
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

/// Model list endpoint (health check)
async fn handle_list_models() -> Json<Value> {
    Json(json!({
        "models": [
            {"name": "models/gemini-1.5-pro"},
            {"name": "models/gemini-2.0-flash"}
        ]
    }))
}

/// generateContent endpoint
async fn handle_generate(
    State(state): State<Arc<MockState>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = call
        .strip_suffix(":generateContent")
        .unwrap_or(&call)
        .to_string();
    let recorded = RecordedRequest {
        model,
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    let scripted = state.replies.lock().unwrap().pop_front();
    let (status, reply) = match scripted {
        Some(r) => r,
        None => (StatusCode::OK, candidate(&default_reply(&recorded))),
    };

    state.requests.lock().unwrap().push(recorded);
    (status, Json(reply)).into_response()
}

/// Pick a plausible reply from the prompt content
///
/// These patterns match the prompt files in prompts/*.md
fn default_reply(request: &RecordedRequest) -> String {
    let prompt = request.prompt();

    if prompt.contains("Item: [name of item]") {
        "Item: Ceramic coffee mug\nFact: Ceramic mugs retain heat longer than glass.".to_string()
    } else if request.has_image() || prompt.contains("\"facts\"") {
        r#"{"name": "Ceramic Coffee Mug", "cost": 14.99, "facts": "Dishwasher safe."}"#
            .to_string()
    } else if prompt.contains("Find a cheaper alternative") {
        "null".to_string()
    } else if prompt.contains("Charlie Munger") {
        r#"{"decision": "Buy", "explanation": "The item is modestly priced relative to income."}"#
            .to_string()
    } else {
        "Hello from the mock Gemini server.".to_string()
    }
}
