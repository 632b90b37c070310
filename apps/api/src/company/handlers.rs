use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::company::validate_letterhead;
use crate::errors::AppError;
use crate::models::company::{Letterhead, LetterheadInput, Signatory};
use crate::offer::draft::find_director;
use crate::offer::handlers::ConfirmQuery;
use crate::state::AppState;

fn letterhead_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Letterhead {id} not found"))
}

/// GET /api/v1/letterheads
pub async fn handle_list_letterheads(
    State(state): State<AppState>,
) -> Result<Json<Vec<Letterhead>>, AppError> {
    Ok(Json(state.store.list_letterheads().await?))
}

/// GET /api/v1/letterheads/:id
pub async fn handle_get_letterhead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Letterhead>, AppError> {
    let letterhead = state
        .store
        .get_letterhead(id)
        .await?
        .ok_or_else(|| letterhead_not_found(id))?;
    Ok(Json(letterhead))
}

/// POST /api/v1/letterheads
pub async fn handle_create_letterhead(
    State(state): State<AppState>,
    Json(input): Json<LetterheadInput>,
) -> Result<(StatusCode, Json<Letterhead>), AppError> {
    let input = validate_letterhead(input).map_err(AppError::Validation)?;
    let letterhead = state.store.create_letterhead(input).await?;
    Ok((StatusCode::CREATED, Json(letterhead)))
}

/// PUT /api/v1/letterheads/:id
pub async fn handle_update_letterhead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<LetterheadInput>,
) -> Result<Json<Letterhead>, AppError> {
    let input = validate_letterhead(input).map_err(AppError::Validation)?;
    let letterhead = state
        .store
        .update_letterhead(id, input)
        .await?
        .ok_or_else(|| letterhead_not_found(id))?;
    Ok(Json(letterhead))
}

/// DELETE /api/v1/letterheads/:id?confirm=true
pub async fn handle_delete_letterhead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    confirm.require("a letterhead")?;
    if !state.store.delete_letterhead(id).await? {
        return Err(letterhead_not_found(id));
    }
    info!("Deleted letterhead {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/signatories
pub async fn handle_list_signatories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Signatory>>, AppError> {
    Ok(Json(state.store.list_signatories().await?))
}

/// GET /api/v1/signatories/director
///
/// First signatory with a director-level position.
pub async fn handle_director_signatory(
    State(state): State<AppState>,
) -> Result<Json<Signatory>, AppError> {
    let signatories = state.store.list_signatories().await?;
    let director = find_director(&signatories)
        .cloned()
        .ok_or_else(|| AppError::NotFound("No director-level signatory configured".to_string()))?;
    Ok(Json(director))
}
