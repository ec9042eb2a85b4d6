//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use munger_core::{GeminiBackend, MockBackend, TaskType};
use munger_core::test_utils::MockGeminiServer;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "munger-test-boundary";

fn setup_test_app(mock: &MockBackend) -> (Router, TempDir) {
    let uploads = TempDir::new().unwrap();
    let advisor = PurchaseAdvisor::embedded(AIClient::Mock(mock.clone())).unwrap();
    let config = ServerConfig {
        uploads_dir: uploads.path().to_path_buf(),
    };
    (create_router(Some(advisor), None, config), uploads)
}

fn setup_unconfigured_app() -> Router {
    create_router(None, None, ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"item.jpg\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_multipart(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/identify")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

// ========== Chat API Tests ==========

#[tokio::test]
async fn test_chat_reply() {
    let mock = MockBackend::new();
    mock.push_reply("Invert, always invert.");
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/chat",
            serde_json::json!({"message": "Any advice?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["reply"], "Invert, always invert.");

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].task, TaskType::Chat);
    assert_eq!(calls[0].prompt, "Any advice?");
}

#[tokio::test]
async fn test_chat_missing_message() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json("/api/chat", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No message provided");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_chat_blank_message_and_bad_json() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", serde_json::json!({"message": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No message provided");
}

#[tokio::test]
async fn test_chat_upstream_failure() {
    let mock = MockBackend::new();
    mock.push_failure("quota exceeded");
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json("/api/chat", serde_json::json!({"message": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    // Upstream detail stays in the log
    assert_eq!(json["error"], "Failed to process request");
}

#[tokio::test]
async fn test_chat_get_not_allowed() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/chat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Method Not Allowed");
}

#[tokio::test]
async fn test_chat_without_backend() {
    let app = setup_unconfigured_app();

    let response = app
        .oneshot(post_json("/api/chat", serde_json::json!({"message": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "AI backend not configured");
}

// ========== Identify API Tests ==========

#[tokio::test]
async fn test_identify_image() {
    let mock = MockBackend::new();
    mock.push_reply("Item: Espresso machine\nFact: The first espresso machine was patented in 1884.");
    let (app, uploads) = setup_test_app(&mock);

    let response = app
        .clone()
        .oneshot(post_multipart(multipart_body(
            "image",
            "image/jpeg",
            b"fake-jpeg-bytes",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["itemName"], "Espresso machine");
    assert_eq!(
        json["itemFact"],
        "The first espresso machine was patented in 1884."
    );

    let image_url = json["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("/uploads/"));
    assert!(image_url.ends_with(".jpg"));

    // Image went to the model inline
    let calls = mock.calls();
    assert_eq!(calls[0].task, TaskType::QuickIdentify);
    let image = calls[0].image.as_ref().unwrap();
    assert_eq!(image.bytes, b"fake-jpeg-bytes");
    assert_eq!(image.mime_type, "image/jpeg");

    // Stored copy is served back
    let file_name = image_url.trim_start_matches("/uploads/");
    assert!(uploads.path().join(file_name).exists());

    let response = app
        .oneshot(
            Request::builder()
                .uri(image_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"fake-jpeg-bytes");
}

#[tokio::test]
async fn test_identify_missing_image() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_multipart(multipart_body("photo", "image/jpeg", b"bytes")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No image provided");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_identify_not_multipart() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json("/api/identify", serde_json::json!({"image": "x"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "No image provided");
}

#[tokio::test]
async fn test_identify_upstream_failure() {
    let mock = MockBackend::new();
    mock.push_failure("vision model unavailable");
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_multipart(multipart_body(
            "image",
            "image/png",
            b"png-bytes",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = get_body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Failed to process image");
}

#[tokio::test]
async fn test_identify_get_not_allowed() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/identify")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ========== Advise API Tests ==========

#[tokio::test]
async fn test_advise_buy() {
    let mock = MockBackend::new();
    mock.push_reply(r#"{"decision": "Buy", "explanation": "It is a durable tool you use daily."}"#);
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/advise",
            serde_json::json!({
                "request": {"itemName": "Laptop", "itemCost": "1200", "purpose": "Work"},
                "profile": {"monthlyIncome": "5000", "housingCost": "1500"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["decision"], "Buy");
    assert_eq!(json["reasoning"], "It is a durable tool you use daily.");
    assert_eq!(json["itemName"], "Laptop");
    assert!(json.get("alternative").is_none());

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("Purpose of purchase: Work"));
    assert!(calls[0].prompt.contains("- Monthly Net Income: $3500.00"));
}

#[tokio::test]
async fn test_advise_with_alternative_and_image() {
    let mock = MockBackend::new();
    mock.push_reply(r#"{"name": "Moka Pot", "cost": 450, "facts": "Stovetop brewer."}"#)
        .push_reply(r#"{"name": "Bialetti Moka Express", "price": 39.99, "retailer": "Amazon", "url": "https://www.amazon.com/dp/B0000"}"#)
        .push_reply("Don't Buy: The moka pot makes good coffee for a tenth of the price.");
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/advise",
            serde_json::json!({
                "request": {"itemName": "", "itemCost": 450},
                "findAlternative": true,
                "imageBase64": "aW1hZ2UtYnl0ZXM=",
                "imageMimeType": "image/png"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["decision"], "Don't Buy");
    assert_eq!(json["itemName"], "Moka Pot");
    assert_eq!(json["alternative"]["retailer"], "Amazon");

    assert_eq!(
        mock.call_tasks(),
        vec![TaskType::Vision, TaskType::Search, TaskType::Recommendation]
    );
    let calls = mock.calls();
    let image = calls[0].image.as_ref().unwrap();
    assert_eq!(image.bytes, b"image-bytes");
    assert_eq!(image.mime_type, "image/png");
}

#[tokio::test]
async fn test_advise_validation_error() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/advise",
            serde_json::json!({"request": {"itemName": "Laptop", "itemCost": ""}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Please enter the cost of the item");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_advise_bad_image_data() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/advise",
            serde_json::json!({
                "request": {"itemCost": 20},
                "imageBase64": "***not base64***"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Invalid base64 image data");
}

#[tokio::test]
async fn test_advise_upstream_failure_is_error_decision() {
    let mock = MockBackend::new();
    mock.push_failure("timeout");
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(post_json(
            "/api/advise",
            serde_json::json!({"request": {"itemName": "Chair", "itemCost": 250}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["decision"], "Error");
    assert!(json["reasoning"]
        .as_str()
        .unwrap()
        .starts_with("Technical error occurred"));
}

// ========== Summary API Tests ==========

#[tokio::test]
async fn test_summary() {
    let app = setup_unconfigured_app();

    let response = app
        .oneshot(post_json(
            "/api/summary",
            serde_json::json!({
                "monthlyIncome": "5000",
                "housingCost": "1500",
                "creditCardPayment": "200",
                "currentCreditBalance": "1000",
                "creditLimit": "10000",
                "emergencyFund": "3400"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["monthlyIncome"], "5000");
    assert_eq!(json["summary"]["monthlyNetIncome"], 3300.0);
    assert_eq!(json["summary"]["debtToIncomeRatio"], 4.0);
    assert_eq!(json["summary"]["creditUtilization"], 10.0);
    assert_eq!(json["summary"]["emergencyFundMonths"], 2.0);
    assert!(json["ratings"].is_object());
}

#[tokio::test]
async fn test_summary_rejects_non_object() {
    let app = setup_unconfigured_app();

    let response = app
        .oneshot(post_json("/api/summary", serde_json::json!([1, 2, 3])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Health API Tests ==========

#[tokio::test]
async fn test_health_with_mock_backend() {
    let mock = MockBackend::new();
    let (app, _uploads) = setup_test_app(&mock);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "mock");
    assert_eq!(json["available"], true);
}

#[tokio::test]
async fn test_health_without_backend() {
    let app = setup_unconfigured_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["backend"].is_null());
    assert_eq!(json["available"], false);
}

// ========== Security Header Tests ==========

#[tokio::test]
async fn test_security_headers() {
    let app = setup_unconfigured_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

// ========== End-to-end with the Gemini wire format ==========

#[tokio::test]
async fn test_chat_through_gemini_backend() {
    let server = MockGeminiServer::start().await;
    server.push_text("Avoid stupidity rather than seek brilliance.");

    let backend = AIClient::Gemini(GeminiBackend::with_host(&server.url(), "test-key"));
    let advisor = PurchaseAdvisor::embedded(backend).unwrap();
    let app = create_router(Some(advisor), None, ServerConfig::default());

    let response = app
        .oneshot(post_json(
            "/api/chat",
            serde_json::json!({"message": "Give me one rule."}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["reply"], "Avoid stupidity rather than seek brilliance.");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gemini-pro");
    assert_eq!(requests[0].api_key.as_deref(), Some("test-key"));
    assert_eq!(requests[0].prompt(), "Give me one rule.");
}
