use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::error::ReviewError;
use crate::models::{ReviewRequest, ReviewResponse};
use crate::state::AppState;

/// POST /review - Retrieve guideline context for a diff and return the
/// model's review.
pub async fn review(
    State(state): State<AppState>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ReviewError> {
    let Json(req) = body.map_err(|e| ReviewError::InvalidBody(e.body_text()))?;
    let resp = state.review.review(&req).await?;
    Ok(Json(resp))
}
