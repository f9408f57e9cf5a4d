use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use super::{hr_error, ApiError};
use crate::{
    extractors::{AppJson, AppPath},
    models::hr::ApplyPlanRequest,
    services::AppState,
};

/// GET /api/v1/hr/{id}/plan
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    AppPath(hr_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .hr_credits
        .plan_summary(&hr_id)
        .await
        .map_err(hr_error)?;
    Ok(Json(summary))
}

/// POST /api/v1/hr/{id}/plan - activation after a confirmed payment
pub async fn apply_plan(
    State(state): State<Arc<AppState>>,
    AppPath(hr_id): AppPath<String>,
    AppJson(req): AppJson<ApplyPlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Applying plan {:?} for HR {}", req.plan, hr_id);

    let summary = state
        .hr_credits
        .apply_plan(&hr_id, req.plan)
        .await
        .map_err(hr_error)?;
    Ok(Json(summary))
}

/// POST /api/v1/hr/{id}/candidates/{candidate_id}/view
pub async fn view_candidate(
    State(state): State<Arc<AppState>>,
    AppPath((hr_id, candidate_id)): AppPath<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("HR {} requested candidate {}", hr_id, candidate_id);

    let (candidate, plan) = state
        .hr_credits
        .view_candidate(&hr_id, &candidate_id)
        .await
        .map_err(hr_error)?;

    Ok(Json(json!({
        "candidate": candidate,
        "plan": plan
    })))
}
