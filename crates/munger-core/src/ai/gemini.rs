//! Gemini backend implementation
//!
//! HTTP client for the `generateContent` endpoint of the Gemini API. Model
//! and generation settings come from each request's task configuration,
//! unless a single model is forced with `GEMINI_MODEL`.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::types::GenerationRequest;
use super::AIBackend;

/// Public Gemini API host
pub const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model_override: Option<String>,
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("model_override", &self.model_override)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Create a backend against the public Gemini API
    pub fn new(api_key: &str) -> Self {
        Self::with_host(DEFAULT_HOST, api_key)
    }

    /// Create a backend against a custom host (proxies, test servers)
    pub fn with_host(host: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: host.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_override: None,
        }
    }

    /// Create a new instance that sends every task to `model`
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model_override: Some(model.to_string()),
            ..self.clone()
        }
    }

    /// Create from environment variables
    ///
    /// Requires `GEMINI_API_KEY`. `GEMINI_HOST` and `GEMINI_MODEL` are optional.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let backend = Self::with_host(&host, &api_key);
        match std::env::var("GEMINI_MODEL") {
            Ok(model) if !model.trim().is_empty() => Some(backend.with_model(model.trim())),
            _ => Some(backend),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    /// Base64-encoded bytes
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

/// Response body from `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Error body returned on non-success status
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = vec![Part::Text {
        text: request.prompt.clone(),
    }];

    if let Some(ref image) = request.image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
            },
        });
    }

    let tools = if request.config.google_search {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    } else {
        Vec::new()
    };

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            temperature: request.config.temperature,
            max_output_tokens: request.config.max_output_tokens,
            top_p: request.config.top_p,
        },
        tools,
    }
}

/// Text of the first part of the first candidate
fn first_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::InvalidData("Gemini response contained no candidates".into()))?;

    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| Error::InvalidData("Gemini candidate contained no text part".into()))
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let model = self
            .model_override
            .as_deref()
            .unwrap_or(request.config.model.as_str());
        let body = build_request_body(request);

        let response = self
            .http_client
            .post(self.generate_url(model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(request.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&raw)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = first_text(parsed)?;
        debug!(task = request.task.as_str(), model, "Gemini response: {}", text);

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1beta/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        self.model_override.as_deref().unwrap_or("per-task")
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_config::{ModelConfig, TaskType};
    use crate::models::ImageInput;
    use crate::test_utils::MockGeminiServer;

    fn request(task: TaskType, prompt: &str) -> GenerationRequest {
        let config = ModelConfig::embedded().unwrap();
        GenerationRequest::new(task, config.task(task), prompt)
    }

    /// Body as it goes over the wire
    fn wire_json(request: &GenerationRequest) -> serde_json::Value {
        let text = serde_json::to_string(&build_request_body(request)).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_request_body_text_only() {
        let json = wire_json(&request(TaskType::Recommendation, "Should I?"));

        assert_eq!(json["contents"][0]["parts"][0]["text"], "Should I?");
        assert_eq!(json["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(json["generationConfig"]["temperature"], 0.2);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 800);
        assert_eq!(json["generationConfig"]["topP"], 0.8);
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_request_body_inline_image() {
        let req = request(TaskType::Vision, "What is this?")
            .with_image(ImageInput::new(vec![1, 2, 3], "image/png"));
        let json = wire_json(&req);

        let image = &json["contents"][0]["parts"][1]["inline_data"];
        assert_eq!(image["mime_type"], "image/png");
        assert_eq!(image["data"], "AQID");
        assert!(json["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn test_request_body_search_tool() {
        let json = wire_json(&request(TaskType::Search, "find"));
        assert_eq!(json["tools"], serde_json::json!([{"google_search": {}}]));
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn test_first_text_empty_candidates() {
        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(first_text(empty), Err(Error::InvalidData(_))));

        let missing: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(first_text(missing), Err(Error::InvalidData(_))));

        let no_parts: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert!(matches!(first_text(no_parts), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let backend = GeminiBackend::new("secret-key");
        assert!(!format!("{:?}", backend).contains("secret-key"));
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let server = MockGeminiServer::start().await;
        server.push_text("Buy: fine.");

        let backend = GeminiBackend::with_host(&server.url(), "test-key");
        let text = backend
            .generate(&request(TaskType::Recommendation, "Laptop?"))
            .await
            .unwrap();
        assert_eq!(text, "Buy: fine.");

        let calls = server.requests();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "gemini-1.5-pro");
        assert_eq!(calls[0].api_key.as_deref(), Some("test-key"));
        assert_eq!(calls[0].body["contents"][0]["parts"][0]["text"], "Laptop?");
    }

    #[tokio::test]
    async fn test_generate_model_override() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiBackend::with_host(&server.url(), "k").with_model("gemini-2.5-flash");

        backend
            .generate(&request(TaskType::Search, "find"))
            .await
            .unwrap();
        assert_eq!(server.requests()[0].model, "gemini-2.5-flash");
        assert_eq!(backend.model(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let server = MockGeminiServer::start().await;
        server.push_error(403, "API key not valid");

        let backend = GeminiBackend::with_host(&server.url(), "bad");
        let err = backend
            .generate(&request(TaskType::Chat, "hi"))
            .await
            .unwrap_err();

        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_candidates() {
        let server = MockGeminiServer::start().await;
        server.push_raw(200, serde_json::json!({"candidates": []}));

        let backend = GeminiBackend::with_host(&server.url(), "k");
        let err = backend
            .generate(&request(TaskType::Chat, "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiBackend::with_host(&server.url(), "k");
        assert!(backend.health_check().await);

        let down = GeminiBackend::with_host("http://127.0.0.1:1", "k");
        assert!(!down.health_check().await);
    }
}
