//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use munger_core::AIBackend;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Backend kind, `None` when no backend is configured
    pub backend: Option<&'static str>,
    pub host: Option<String>,
    pub model: Option<String>,
    /// Whether the backend answered its health check
    pub available: bool,
}

/// GET /api/health - Server and AI backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let Some(advisor) = state.advisor.as_ref() else {
        return Json(HealthResponse {
            status: "ok",
            backend: None,
            host: None,
            model: None,
            available: false,
        });
    };

    let backend = advisor.backend();
    Json(HealthResponse {
        status: "ok",
        backend: Some(backend.backend_name()),
        host: Some(backend.host().to_string()),
        model: Some(backend.model().to_string()),
        available: backend.health_check().await,
    })
}
