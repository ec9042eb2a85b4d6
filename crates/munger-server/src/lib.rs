//! Munger Web Server
//!
//! Axum-based HTTP proxy in front of the generative model, so browsers and
//! other front ends never hold the API key.
//!
//! Routes:
//! - `POST /api/chat`: free-form chat message
//! - `POST /api/identify`: multipart image upload, quick "Item:/Fact:" identification
//! - `POST /api/advise`: full purchase recommendation
//! - `POST /api/summary`: financial summary and ratings for a profile
//! - `GET /api/health`: backend status
//! - `GET /uploads/<file>`: stored images

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use munger_core::{AIBackend, AIClient, PurchaseAdvisor};

mod handlers;

/// Maximum image upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Where identified images are stored and served from
    pub uploads_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// `None` when no AI backend is configured; AI routes then answer 503
    pub advisor: Option<PurchaseAdvisor>,
    pub uploads_dir: PathBuf,
}

impl AppState {
    /// The advisor, or a 503 when no backend is configured
    pub fn advisor(&self) -> Result<&PurchaseAdvisor, AppError> {
        self.advisor
            .as_ref()
            .ok_or_else(|| AppError::service_unavailable("AI backend not configured"))
    }
}

/// Create the application router
pub fn create_router(
    advisor: Option<PurchaseAdvisor>,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> Router {
    match advisor {
        Some(ref a) => info!(
            "AI backend configured: {} ({}, model: {})",
            a.backend().host(),
            a.backend().backend_name(),
            a.backend().model()
        ),
        None => info!("ℹ️  AI backend not configured (set GEMINI_API_KEY to enable AI features)"),
    }

    let uploads_dir = config.uploads_dir.clone();
    let state = Arc::new(AppState {
        advisor,
        uploads_dir: config.uploads_dir,
    });

    let api_routes = Router::new()
        .route(
            "/chat",
            post(handlers::chat).fallback(method_not_allowed),
        )
        .route(
            "/identify",
            post(handlers::identify_image)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .route(
            "/advise",
            post(handlers::advise)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE * 2)),
        )
        .route(
            "/summary",
            post(handlers::summarize).fallback(method_not_allowed),
        )
        .route("/health", get(handlers::health));

    let mut app = Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Build the advisor from environment variables and the user's overrides
///
/// Returns `Ok(None)` when no backend is configured.
pub fn advisor_from_env() -> anyhow::Result<Option<PurchaseAdvisor>> {
    match AIClient::from_env() {
        Some(client) => Ok(Some(PurchaseAdvisor::load(client)?)),
        None => Ok(None),
    }
}

/// Start the server
pub async fn serve(
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let advisor = advisor_from_env()?;
    check_ai_connection(advisor.as_ref()).await;

    let app = create_router(advisor, static_dir, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(advisor: Option<&PurchaseAdvisor>) {
    let Some(advisor) = advisor else {
        return;
    };
    let backend = advisor.backend();

    if backend.health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            backend.host(),
            backend.model()
        );
    } else {
        warn!(
            "⚠️  AI backend configured but not responding: {}",
            backend.host()
        );
    }
}

/// Non-POST requests on the POST-only routes
async fn method_not_allowed() -> AppError {
    AppError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn new(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(msg: &str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    /// Keep `err` for the log while the client sees only the message
    pub fn with_internal(mut self, err: impl Into<anyhow::Error>) -> Self {
        self.internal = Some(err.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests;
