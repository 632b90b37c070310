//! Data source seam.
//!
//! `AppState` holds an `Arc<dyn HrStore>`, chosen once at startup from
//! `DATA_SOURCE`. Handlers never know which backend they are talking to.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::candidate::{Candidate, NewCandidate, PipelineStage};
use crate::models::company::{Letterhead, LetterheadInput, Signatory};
use crate::models::offer_letter::OfferLetter;
use crate::models::response::{CandidateResponse, ResponseLink};
use crate::models::template_profile::TemplateProfile;
use crate::offer::draft::OfferSubmission;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of trying to record a candidate response.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Accepted(ResponseLink),
    AlreadySubmitted(ResponseLink),
    UnknownToken,
}

#[async_trait]
pub trait HrStore: Send + Sync {
    // Candidates
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>>;
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;
    async fn insert_candidates(&self, candidates: Vec<NewCandidate>) -> Result<Vec<Candidate>>;
    async fn set_candidate_stage(&self, id: Uuid, stage: PipelineStage) -> Result<Option<Candidate>>;

    // Signatories & letterheads
    async fn list_signatories(&self) -> Result<Vec<Signatory>>;
    async fn list_letterheads(&self) -> Result<Vec<Letterhead>>;
    async fn get_letterhead(&self, id: Uuid) -> Result<Option<Letterhead>>;
    async fn create_letterhead(&self, input: LetterheadInput) -> Result<Letterhead>;
    async fn update_letterhead(&self, id: Uuid, input: LetterheadInput) -> Result<Option<Letterhead>>;
    async fn delete_letterhead(&self, id: Uuid) -> Result<bool>;

    // Template profiles
    async fn list_template_profiles(&self) -> Result<Vec<TemplateProfile>>;

    // Offer letters
    async fn list_offer_letters(&self) -> Result<Vec<OfferLetter>>;
    async fn get_offer_letter(&self, id: Uuid) -> Result<Option<OfferLetter>>;
    async fn create_offer_letter(&self, submission: OfferSubmission) -> Result<OfferLetter>;
    async fn update_offer_letter(
        &self,
        id: Uuid,
        submission: OfferSubmission,
    ) -> Result<Option<OfferLetter>>;
    async fn delete_offer_letter(&self, id: Uuid) -> Result<bool>;
    /// Most frequently used working location across stored letters.
    async fn learned_working_location(&self) -> Result<Option<String>>;

    // Candidate response links
    async fn create_response_link(&self, candidate: &Candidate) -> Result<ResponseLink>;
    async fn get_response_link(&self, token: &str) -> Result<Option<ResponseLink>>;
    /// Records the response unless one was already recorded for this token.
    async fn submit_candidate_response(
        &self,
        token: &str,
        response: CandidateResponse,
    ) -> Result<SubmitOutcome>;
}

/// Picks the most frequent non-empty location. Ties go to the most recently used one.
///
/// `locations` must be ordered oldest first.
pub fn most_common_location<'a>(locations: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, location) in locations.into_iter().enumerate() {
        let location = location.trim();
        if location.is_empty() {
            continue;
        }
        let entry = counts.entry(location).or_insert((0, position));
        entry.0 += 1;
        entry.1 = position;
    }
    counts
        .into_iter()
        .max_by_key(|(_, (count, last_seen))| (*count, *last_seen))
        .map(|(location, _)| location.to_string())
}

/// Opaque token for a public response link.
pub fn new_response_token() -> String {
    Uuid::new_v4().simple().to_string()
}
