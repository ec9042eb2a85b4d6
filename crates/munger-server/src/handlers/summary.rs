//! Financial summary handler

use axum::{extract::rejection::JsonRejection, Json};
use serde::Serialize;

use munger_core::{rate_summary, FinancialProfile, ProfileSnapshot, SummaryRatings};

use crate::AppError;

/// Snapshot (profile fields plus `summary`) with a rating per metric
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub snapshot: ProfileSnapshot,
    pub ratings: SummaryRatings,
}

/// POST /api/summary - Compute the derived metrics for a profile
pub async fn summarize(
    body: Result<Json<FinancialProfile>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(profile) = body.map_err(|e| AppError::bad_request(&e.body_text()))?;

    let snapshot = ProfileSnapshot::from_profile(profile);
    let ratings = rate_summary(&snapshot.summary);

    Ok(Json(SummaryResponse { snapshot, ratings }))
}
