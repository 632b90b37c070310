use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::response::{CandidateResponse, ResponseLink};
use crate::responses::{
    validate_response, ResponsePageView, ALREADY_SUBMITTED_MESSAGE, COMPLETION_MESSAGE,
};
use crate::state::AppState;
use crate::store::SubmitOutcome;

#[derive(Serialize)]
pub struct SubmitResponseResult {
    pub message: &'static str,
}

fn unknown_token() -> AppError {
    AppError::NotFound("This response link is invalid or has expired".to_string())
}

/// POST /api/v1/candidates/:id/response-link
pub async fn handle_create_response_link(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ResponseLink>), AppError> {
    let candidate = state
        .store
        .get_candidate(candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    let link = state.store.create_response_link(&candidate).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// GET /api/v1/public/responses/:token
pub async fn handle_get_response_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ResponsePageView>, AppError> {
    let link = state
        .store
        .get_response_link(&token)
        .await?
        .ok_or_else(unknown_token)?;
    Ok(Json(ResponsePageView::from(&link)))
}

/// POST /api/v1/public/responses/:token
///
/// Accepts the first response only. Repeats get 409 and nothing is stored,
/// whatever the repeat payload looks like.
pub async fn handle_submit_response(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(response): Json<CandidateResponse>,
) -> Result<Json<SubmitResponseResult>, AppError> {
    let link = state
        .store
        .get_response_link(&token)
        .await?
        .ok_or_else(unknown_token)?;
    if link.submitted_at.is_some() {
        return Err(AppError::Conflict(ALREADY_SUBMITTED_MESSAGE.to_string()));
    }

    let response = validate_response(response).map_err(AppError::Validation)?;

    match state.store.submit_candidate_response(&token, response).await? {
        SubmitOutcome::Accepted(link) => {
            info!("Recorded response for candidate {}", link.candidate_id);
            Ok(Json(SubmitResponseResult {
                message: COMPLETION_MESSAGE,
            }))
        }
        SubmitOutcome::AlreadySubmitted(link) => {
            info!(
                "Ignored repeat response for candidate {}",
                link.candidate_id
            );
            Err(AppError::Conflict(ALREADY_SUBMITTED_MESSAGE.to_string()))
        }
        SubmitOutcome::UnknownToken => Err(unknown_token()),
    }
}
