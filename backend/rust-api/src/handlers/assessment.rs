use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::{api_error, assessment_error, ApiError};
use crate::{
    extractors::{AppJson, AppPath},
    models::assessment::{Level, SubmitAttemptRequest, SubmittedAnswers},
    services::AppState,
};

/// GET /api/v1/candidates/{id}/assessment
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    AppPath(candidate_id): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Resolving current level for candidate {}", candidate_id);

    let progress = state
        .assessment
        .current_level(&candidate_id)
        .await
        .map_err(assessment_error)?;

    Ok(Json(progress))
}

/// GET /api/v1/candidates/{id}/assessment/levels/{level}
pub async fn get_level_questions(
    State(state): State<Arc<AppState>>,
    AppPath((candidate_id, level)): AppPath<(String, Level)>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Loading level {} questions for candidate {}",
        level,
        candidate_id
    );

    let questions = state
        .assessment
        .questions_for(&candidate_id, level)
        .await
        .map_err(assessment_error)?;

    Ok(Json(json!({
        "level": level,
        "questions": questions
    })))
}

/// POST /api/v1/candidates/{id}/assessment/levels/{level}/submit
pub async fn submit_level(
    State(state): State<Arc<AppState>>,
    AppPath((candidate_id, level)): AppPath<(String, Level)>,
    AppJson(req): AppJson<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let outcome = state
        .assessment
        .submit_attempt(&candidate_id, level, SubmittedAnswers::from(req.answers))
        .await
        .map_err(assessment_error)?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
