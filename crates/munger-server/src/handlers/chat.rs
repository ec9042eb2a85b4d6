//! Chat handler

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/chat - Relay one message to the model
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body
        .ok()
        .and_then(|Json(req)| req.message)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("No message provided"))?;

    let advisor = state.advisor()?;
    let reply = advisor
        .chat(&message)
        .await
        .map_err(|e| AppError::internal("Failed to process request").with_internal(e))?;

    Ok(Json(ChatResponse { reply }))
}
