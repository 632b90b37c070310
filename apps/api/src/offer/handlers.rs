//! Axum route handlers for salary breakdowns, offer drafts, offer letters and editing sessions.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::{Letterhead, Signatory};
use crate::models::offer_letter::OfferLetter;
use crate::models::template_profile::TemplateProfile;
use crate::offer::draft::{prefill_form, OfferLetterForm, OfferSubmission, PrefillContext};
use crate::offer::salary::{
    compute_breakdown, total_annual, total_per_month, SalaryComponent, SalarySplit,
};
use crate::offer::session::OfferSession;
use crate::offer::template::{resolve_template, TemplateSummary};
use crate::pdf::document::{compose_letter, LetterInputs};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BreakdownRequest {
    pub annual_ctc: i64,
    #[serde(default)]
    pub split: SalarySplit,
}

#[derive(Debug, Serialize)]
pub struct BreakdownResponse {
    pub annual_ctc: i64,
    pub split: SalarySplit,
    pub components: Vec<SalaryComponent>,
    pub total_annual: i64,
    pub total_per_month: i64,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub form: OfferLetterForm,
    pub template: TemplateSummary,
    pub signatories: Vec<Signatory>,
    pub letterheads: Vec<Letterhead>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub selected: Option<Uuid>,
}

/// Destructive calls need `?confirm=true`.
#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl ConfirmQuery {
    pub fn require(&self, what: &str) -> Result<(), AppError> {
        if self.confirm {
            Ok(())
        } else {
            Err(AppError::ConfirmationRequired(format!(
                "Deleting {what} cannot be undone; repeat the request with confirm=true"
            )))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub candidate_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub session: OfferSession,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Rejects a submission that points at a candidate, signatory or letterhead the store does not have.
async fn check_references(state: &AppState, submission: &OfferSubmission) -> Result<(), AppError> {
    let store = &state.store;
    let candidate = async {
        match submission.candidate_id {
            Some(id) => store.get_candidate(id).await.map(|c| c.is_some()),
            None => Ok(false),
        }
    };
    let (signatories, letterheads, candidate_exists) =
        tokio::try_join!(store.list_signatories(), store.list_letterheads(), candidate)?;

    submission.check_references(&signatories, &letterheads, candidate_exists)?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Salary & templates
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/salary/breakdown
pub async fn handle_salary_breakdown(
    Json(request): Json<BreakdownRequest>,
) -> Json<BreakdownResponse> {
    let components = compute_breakdown(request.annual_ctc, request.split);
    Json(BreakdownResponse {
        annual_ctc: request.annual_ctc,
        split: request.split,
        total_annual: total_annual(&components),
        total_per_month: total_per_month(&components),
        components,
    })
}

/// GET /api/v1/template-profiles
pub async fn handle_list_template_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateProfile>>, AppError> {
    Ok(Json(state.store.list_template_profiles().await?))
}

/// GET /api/v1/template-profiles/resolve?selected=<id>
pub async fn handle_resolve_template(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<TemplateSummary>, AppError> {
    let profiles = state.store.list_template_profiles().await?;
    Ok(Json(resolve_template(&profiles, query.selected).summary()))
}

// ────────────────────────────────────────────────────────────────────────────
// Draft prefill
// ────────────────────────────────────────────────────────────────────────────

/// Loads everything the prefill needs in one round of concurrent fetches.
async fn build_draft(state: &AppState, candidate_id: Uuid) -> Result<DraftResponse, AppError> {
    let store = &state.store;
    let (candidate, signatories, letterheads, profiles, learned_location) = tokio::try_join!(
        store.get_candidate(candidate_id),
        store.list_signatories(),
        store.list_letterheads(),
        store.list_template_profiles(),
        store.learned_working_location(),
    )?;

    let candidate =
        candidate.ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

    let template = resolve_template(&profiles, None);
    let form = prefill_form(
        &candidate,
        &PrefillContext {
            signatories: &signatories,
            letterheads: &letterheads,
            template,
            learned_location: learned_location.as_deref(),
            company_address: &state.config.company_address,
            today: today(),
            offer_validity_days: state.config.offer_validity_days,
        },
    );
    let template = template.summary();

    Ok(DraftResponse {
        form,
        template,
        signatories,
        letterheads,
    })
}

/// GET /api/v1/candidates/:id/offer-draft
pub async fn handle_offer_draft(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<DraftResponse>, AppError> {
    Ok(Json(build_draft(&state, candidate_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Offer letters
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/offer-letters
pub async fn handle_list_offer_letters(
    State(state): State<AppState>,
) -> Result<Json<Vec<OfferLetter>>, AppError> {
    Ok(Json(state.store.list_offer_letters().await?))
}

/// GET /api/v1/offer-letters/:id
pub async fn handle_get_offer_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferLetter>, AppError> {
    let letter = state
        .store
        .get_offer_letter(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer letter {id} not found")))?;
    Ok(Json(letter))
}

/// POST /api/v1/offer-letters
///
/// Validates before touching the store; the breakdown is recomputed from the submitted CTC.
pub async fn handle_create_offer_letter(
    State(state): State<AppState>,
    Json(form): Json<OfferLetterForm>,
) -> Result<(StatusCode, Json<OfferLetter>), AppError> {
    let profiles = state.store.list_template_profiles().await?;
    let template = resolve_template(&profiles, form.template_profile_id);
    let submission = form.validate(&template, today())?;
    check_references(&state, &submission).await?;

    let letter = state.store.create_offer_letter(submission).await?;
    Ok((StatusCode::CREATED, Json(letter)))
}

/// PUT /api/v1/offer-letters/:id
pub async fn handle_update_offer_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<OfferLetterForm>,
) -> Result<Json<OfferLetter>, AppError> {
    let profiles = state.store.list_template_profiles().await?;
    let template = resolve_template(&profiles, form.template_profile_id);
    let submission = form.validate(&template, today())?;
    check_references(&state, &submission).await?;

    let letter = state
        .store
        .update_offer_letter(id, submission)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer letter {id} not found")))?;
    Ok(Json(letter))
}

/// DELETE /api/v1/offer-letters/:id?confirm=true
pub async fn handle_delete_offer_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, AppError> {
    confirm.require("an offer letter")?;
    if !state.store.delete_offer_letter(id).await? {
        return Err(AppError::NotFound(format!("Offer letter {id} not found")));
    }
    info!("Deleted offer letter {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/offer-letters/:id/pdf
///
/// Composes the letter layout, renders it externally and returns the PDF as a download.
pub async fn handle_offer_letter_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let store = &state.store;
    let letter = store
        .get_offer_letter(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Offer letter {id} not found")))?;

    let (letterheads, signatories, profiles) = tokio::try_join!(
        store.list_letterheads(),
        store.list_signatories(),
        store.list_template_profiles(),
    )?;

    let letterhead = letter
        .letterhead_id
        .and_then(|lid| letterheads.iter().find(|l| l.id == lid));
    let signers = [letter.signatory_id, letter.secondary_signatory_id]
        .into_iter()
        .flatten()
        .filter_map(|sid| signatories.iter().find(|s| s.id == sid))
        .collect();
    let profile = letter
        .template_profile_id
        .and_then(|pid| profiles.iter().find(|p| p.id == pid));

    let document = compose_letter(&LetterInputs {
        letter: &letter,
        letterhead,
        signatories: signers,
        profile,
    });
    let pdf = state.renderer.render(&document).await?;

    if let Some(archive) = &state.archive {
        // The user still gets the PDF when archiving fails.
        if let Err(e) = archive.store(id, pdf.clone()).await {
            warn!("Could not archive offer letter {id}: {e}");
        }
    }

    let filename = format!(
        "offer-letter-{}.pdf",
        letter
            .candidate_name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Editing sessions
// ────────────────────────────────────────────────────────────────────────────

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Offer session {id} not found"))
}

/// POST /api/v1/offer-sessions
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let form = match request.candidate_id {
        Some(candidate_id) => build_draft(&state, candidate_id).await?.form,
        None => OfferLetterForm {
            letter_date: Some(today()),
            ..Default::default()
        },
    };

    let session = OfferSession::new(form);
    let session_id = state.sessions.open(session.clone()).await;
    info!("Opened offer session {session_id}");
    Ok((StatusCode::CREATED, Json(SessionView { session_id, session })))
}

/// GET /api/v1/offer-sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    Ok(Json(SessionView {
        session_id: id,
        session,
    }))
}

/// PATCH /api/v1/offer-sessions/:id/form
pub async fn handle_update_session_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<OfferLetterForm>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .update(id, |s| s.update_form(patch).map(|_| s.clone()))
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Json(SessionView {
        session_id: id,
        session,
    }))
}

/// POST /api/v1/offer-sessions/:id/preview
pub async fn handle_preview_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let profiles = state.store.list_template_profiles().await?;
    let today = today();

    let session = state
        .sessions
        .update(id, |s| {
            let selected = s.form().and_then(|f| f.template_profile_id);
            let template = resolve_template(&profiles, selected);
            s.preview(&template, today).map(|_| s.clone())
        })
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Json(SessionView {
        session_id: id,
        session,
    }))
}

/// POST /api/v1/offer-sessions/:id/edit
pub async fn handle_edit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .update(id, |s| s.edit().map(|_| s.clone()))
        .await
        .ok_or_else(|| session_not_found(id))??;
    Ok(Json(SessionView {
        session_id: id,
        session,
    }))
}

/// POST /api/v1/offer-sessions/:id/submit
///
/// One create request. On failure the session drops back to `preview` and the
/// error is returned; resubmitting is the user's call.
pub async fn handle_submit_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<OfferLetter>), AppError> {
    let submission = state
        .sessions
        .update(id, |s| s.begin_submit())
        .await
        .ok_or_else(|| session_not_found(id))??;

    if let Err(e) = check_references(&state, &submission).await {
        state.sessions.update(id, |s| s.abort_submit()).await;
        return Err(e);
    }

    match state.store.create_offer_letter(submission).await {
        Ok(letter) => {
            let letter_id = letter.id;
            // The letter is stored either way; report it even if the session is gone.
            match state.sessions.update(id, |s| s.complete(letter_id)).await {
                Some(Ok(())) => info!("Offer session {id} submitted as letter {letter_id}"),
                Some(Err(e)) => warn!("Offer session {id} stored letter {letter_id} but: {e}"),
                None => warn!("Offer session {id} vanished while storing letter {letter_id}"),
            }
            Ok((StatusCode::CREATED, Json(letter)))
        }
        Err(e) => {
            state.sessions.update(id, |s| s.abort_submit()).await;
            Err(AppError::Internal(e))
        }
    }
}

/// DELETE /api/v1/offer-sessions/:id
///
/// 409 while a submit is in flight.
pub async fn handle_cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.discard(id).await? {
        return Err(session_not_found(id));
    }
    info!("Cancelled offer session {id}");
    Ok(StatusCode::NO_CONTENT)
}
