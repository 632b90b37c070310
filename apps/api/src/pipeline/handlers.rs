use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{Candidate, PipelineStage};
use crate::pipeline::{group_by_stage, prepare_import, ImportReport, SourcedCandidateCard, StageGroup};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ImportRequest {
    pub cards: Vec<SourcedCandidateCard>,
}

#[derive(Deserialize)]
pub struct StageUpdateRequest {
    pub stage: PipelineStage,
}

/// GET /api/v1/pipeline
pub async fn handle_pipeline(
    State(state): State<AppState>,
) -> Result<Json<Vec<StageGroup>>, AppError> {
    let candidates = state.store.list_candidates().await?;
    Ok(Json(group_by_stage(candidates)))
}

/// POST /api/v1/candidates/import
pub async fn handle_import_candidates(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<(StatusCode, Json<ImportReport>), AppError> {
    let (accepted, skipped) = prepare_import(req.cards);
    if accepted.is_empty() && !skipped.is_empty() {
        return Err(AppError::Validation(
            "None of the candidate cards had a name".to_string(),
        ));
    }

    let imported = if accepted.is_empty() {
        Vec::new()
    } else {
        state.store.insert_candidates(accepted).await?
    };
    info!(
        "Imported {} sourced candidates, skipped {}",
        imported.len(),
        skipped.len()
    );
    Ok((StatusCode::CREATED, Json(ImportReport { imported, skipped })))
}

/// PATCH /api/v1/candidates/:id/stage
pub async fn handle_set_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StageUpdateRequest>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state
        .store
        .set_candidate_stage(id, req.stage)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
    info!("Moved candidate {id} to {:?}", req.stage);
    Ok(Json(candidate))
}
