//! Purchase recommendation handler

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use base64::Engine;
use serde::Deserialize;

use munger_core::{
    Error, FinancialProfile, ImageInput, ProfileSnapshot, PurchaseRequest, Recommendation,
};

use crate::{AppError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviseRequest {
    pub request: PurchaseRequest,
    /// Profile to summarize and include as financial context
    #[serde(default)]
    pub profile: Option<FinancialProfile>,
    #[serde(default)]
    pub find_alternative: bool,
    /// Base64 image of the item, used when no name is given
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub image_mime_type: Option<String>,
}

/// POST /api/advise - Run the full recommendation flow
pub async fn advise(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AdviseRequest>, JsonRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(&e.body_text()))?;
    let advisor = state.advisor()?;

    let mut request = body.request;
    if let Some(encoded) = body.image_base64.as_deref().filter(|s| !s.is_empty()) {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| AppError::bad_request("Invalid base64 image data"))?;
        let mime_type = body.image_mime_type.as_deref().unwrap_or("image/jpeg");
        request = request.with_image(ImageInput::new(bytes, mime_type));
    }

    let snapshot = body.profile.map(ProfileSnapshot::from_profile);

    match advisor
        .recommend(&request, snapshot.as_ref(), body.find_alternative)
        .await
    {
        Ok(recommendation) => Ok(Json(recommendation)),
        Err(Error::Validation(msg)) => Err(AppError::bad_request(&msg)),
        Err(e) => Err(e.into()),
    }
}
