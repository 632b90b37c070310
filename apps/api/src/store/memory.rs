//! In-memory store. Backs `DATA_SOURCE=memory` and the test suite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::candidate::{Candidate, NewCandidate, PipelineStage};
use crate::models::company::{Letterhead, LetterheadInput, Signatory};
use crate::models::offer_letter::{OfferLetter, STATUS_GENERATED};
use crate::models::response::{CandidateResponse, ResponseLink};
use crate::models::template_profile::TemplateProfile;
use crate::offer::draft::{full_name, OfferSubmission};
use crate::store::{most_common_location, new_response_token, HrStore, SubmitOutcome};

#[derive(Default)]
struct Tables {
    candidates: Vec<Candidate>,
    signatories: Vec<Signatory>,
    letterheads: Vec<Letterhead>,
    template_profiles: Vec<TemplateProfile>,
    offer_letters: Vec<OfferLetter>,
    response_links: Vec<ResponseLink>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// A store pre-populated with a small demo data set.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let tables = Tables {
            candidates: demo_candidates(now),
            signatories: vec![
                signatory("Priya Nair", "Head of People"),
                signatory("Arjun Mehta", "Managing Director"),
            ],
            letterheads: vec![Letterhead {
                id: Uuid::new_v4(),
                name: "Corporate".to_string(),
                company_name: "Northwind Technologies Pvt. Ltd.".to_string(),
                address: "4th Floor, Prestige Tower, MG Road, Bengaluru 560001".to_string(),
                phone: Some("+91 80 4000 1234".to_string()),
                email: Some("careers@northwind.example".to_string()),
                website: Some("https://northwind.example".to_string()),
                logo_image: None,
                footer_text: Some("CIN U72200KA2015PTC000000".to_string()),
                is_default: true,
                created_at: now,
                updated_at: now,
            }],
            template_profiles: vec![
                TemplateProfile {
                    id: Uuid::new_v4(),
                    profile_name: "Formal engineering offer".to_string(),
                    tone_style: "formal".to_string(),
                    sections_order: [
                        "greeting",
                        "position",
                        "compensation",
                        "responsibilities",
                        "terms",
                        "closing",
                    ]
                    .map(String::from)
                    .to_vec(),
                    has_salary_table: true,
                    has_kra_section: true,
                    is_default: true,
                    usage_count: 12,
                },
                TemplateProfile {
                    id: Uuid::new_v4(),
                    profile_name: "Short-form offer".to_string(),
                    tone_style: "friendly".to_string(),
                    sections_order: ["greeting", "position", "compensation", "closing"]
                        .map(String::from)
                        .to_vec(),
                    has_salary_table: false,
                    has_kra_section: false,
                    is_default: false,
                    usage_count: 4,
                },
            ],
            offer_letters: Vec::new(),
            response_links: Vec::new(),
        };
        info!(
            "Seeded in-memory store with {} candidates",
            tables.candidates.len()
        );
        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn signatory(name: &str, position: &str) -> Signatory {
    Signatory {
        id: Uuid::new_v4(),
        name: name.to_string(),
        position: position.to_string(),
        signature_image: None,
        stamp_image: None,
    }
}

fn demo_candidates(now: DateTime<Utc>) -> Vec<Candidate> {
    vec![
        NewCandidate {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            email: Some("asha.verma@example.com".to_string()),
            address: Some("B-14 Saket".to_string()),
            city: Some("Delhi".to_string()),
            postal_code: Some("110017".to_string()),
            vacancy_title: Some("Backend Engineer".to_string()),
            current_designation: Some("Software Developer".to_string()),
            experience: Some("4 years".to_string()),
            current_salary: Some(900_000),
            expected_salary: Some(1_200_000),
            stage: Some(PipelineStage::Offered),
            ..Default::default()
        },
        NewCandidate {
            first_name: "Rahul".to_string(),
            last_name: "Iyer".to_string(),
            city: Some("Chennai".to_string()),
            state: Some("Tamil Nadu".to_string()),
            current_designation: Some("QA Analyst".to_string()),
            experience: Some("2 years".to_string()),
            current_salary: Some(500_000),
            stage: Some(PipelineStage::Interview),
            ..Default::default()
        },
        NewCandidate {
            first_name: "Meera".to_string(),
            last_name: "Shah".to_string(),
            vacancy_title: Some("Product Designer".to_string()),
            vacancy_location: Some("Mumbai".to_string()),
            stage: Some(PipelineStage::Screening),
            ..Default::default()
        },
    ]
    .into_iter()
    .map(|c| c.into_candidate(Uuid::new_v4(), now))
    .collect()
}

/// Builds the stored row for a validated submission.
fn offer_letter_row(
    id: Uuid,
    submission: OfferSubmission,
    status: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> OfferLetter {
    OfferLetter {
        id,
        candidate_id: submission.candidate_id,
        candidate_name: submission.candidate_name,
        candidate_address: submission.candidate_address,
        designation: submission.designation,
        working_location: submission.working_location,
        joining_date: submission.joining_date,
        offer_valid_till: submission.offer_valid_till,
        letter_date: submission.letter_date,
        annual_ctc: submission.annual_ctc,
        salary_split: submission.salary_split,
        salary_breakdown: Json(submission.salary_breakdown),
        signatory_id: submission.signatory_id,
        secondary_signatory_id: submission.secondary_signatory_id,
        letterhead_id: submission.letterhead_id,
        template_profile_id: submission.template_profile_id,
        template_type: submission.template_type,
        kra_details: submission.kra_details,
        status: status.to_string(),
        created_at,
        updated_at,
    }
}

fn apply_letterhead_input(letterhead: &mut Letterhead, input: LetterheadInput, now: DateTime<Utc>) {
    letterhead.name = input.name;
    letterhead.company_name = input.company_name;
    letterhead.address = input.address;
    letterhead.phone = input.phone;
    letterhead.email = input.email;
    letterhead.website = input.website;
    letterhead.logo_image = input.logo_image;
    letterhead.footer_text = input.footer_text;
    letterhead.is_default = input.is_default;
    letterhead.updated_at = now;
}

#[async_trait]
impl HrStore for MemoryStore {
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let tables = self.tables.read().await;
        Ok(tables.candidates.iter().find(|c| c.id == id).cloned())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.tables.read().await.candidates.clone())
    }

    async fn insert_candidates(&self, candidates: Vec<NewCandidate>) -> Result<Vec<Candidate>> {
        let now = Utc::now();
        let inserted: Vec<Candidate> = candidates
            .into_iter()
            .map(|c| c.into_candidate(Uuid::new_v4(), now))
            .collect();
        self.tables
            .write()
            .await
            .candidates
            .extend(inserted.iter().cloned());
        info!("Inserted {} candidates", inserted.len());
        Ok(inserted)
    }

    async fn set_candidate_stage(&self, id: Uuid, stage: PipelineStage) -> Result<Option<Candidate>> {
        let mut tables = self.tables.write().await;
        Ok(tables.candidates.iter_mut().find(|c| c.id == id).map(|c| {
            c.stage = stage;
            c.clone()
        }))
    }

    async fn list_signatories(&self) -> Result<Vec<Signatory>> {
        Ok(self.tables.read().await.signatories.clone())
    }

    async fn list_letterheads(&self) -> Result<Vec<Letterhead>> {
        Ok(self.tables.read().await.letterheads.clone())
    }

    async fn get_letterhead(&self, id: Uuid) -> Result<Option<Letterhead>> {
        let tables = self.tables.read().await;
        Ok(tables.letterheads.iter().find(|l| l.id == id).cloned())
    }

    async fn create_letterhead(&self, input: LetterheadInput) -> Result<Letterhead> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if input.is_default {
            tables.letterheads.iter_mut().for_each(|l| l.is_default = false);
        }
        let mut letterhead = Letterhead {
            id: Uuid::new_v4(),
            name: String::new(),
            company_name: String::new(),
            address: String::new(),
            phone: None,
            email: None,
            website: None,
            logo_image: None,
            footer_text: None,
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        apply_letterhead_input(&mut letterhead, input, now);
        tables.letterheads.push(letterhead.clone());
        info!("Created letterhead {}", letterhead.id);
        Ok(letterhead)
    }

    async fn update_letterhead(&self, id: Uuid, input: LetterheadInput) -> Result<Option<Letterhead>> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if !tables.letterheads.iter().any(|l| l.id == id) {
            return Ok(None);
        }
        if input.is_default {
            tables
                .letterheads
                .iter_mut()
                .filter(|l| l.id != id)
                .for_each(|l| l.is_default = false);
        }
        let updated = tables.letterheads.iter_mut().find(|l| l.id == id).map(|l| {
            apply_letterhead_input(l, input, now);
            l.clone()
        });
        Ok(updated)
    }

    async fn delete_letterhead(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.letterheads.len();
        tables.letterheads.retain(|l| l.id != id);
        Ok(tables.letterheads.len() != before)
    }

    async fn list_template_profiles(&self) -> Result<Vec<TemplateProfile>> {
        Ok(self.tables.read().await.template_profiles.clone())
    }

    async fn list_offer_letters(&self) -> Result<Vec<OfferLetter>> {
        let mut letters = self.tables.read().await.offer_letters.clone();
        letters.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(letters)
    }

    async fn get_offer_letter(&self, id: Uuid) -> Result<Option<OfferLetter>> {
        let tables = self.tables.read().await;
        Ok(tables.offer_letters.iter().find(|l| l.id == id).cloned())
    }

    async fn create_offer_letter(&self, submission: OfferSubmission) -> Result<OfferLetter> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        if let Some(profile_id) = submission.template_profile_id {
            if let Some(profile) = tables.template_profiles.iter_mut().find(|p| p.id == profile_id) {
                profile.usage_count += 1;
            }
        }
        let letter = offer_letter_row(Uuid::new_v4(), submission, STATUS_GENERATED, now, now);
        tables.offer_letters.push(letter.clone());
        info!("Created offer letter {} for {}", letter.id, letter.candidate_name);
        Ok(letter)
    }

    async fn update_offer_letter(
        &self,
        id: Uuid,
        submission: OfferSubmission,
    ) -> Result<Option<OfferLetter>> {
        let mut tables = self.tables.write().await;
        let Some(existing) = tables.offer_letters.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        let updated = offer_letter_row(id, submission, &existing.status, existing.created_at, Utc::now());
        *existing = updated.clone();
        info!("Updated offer letter {id}");
        Ok(Some(updated))
    }

    async fn delete_offer_letter(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.offer_letters.len();
        tables.offer_letters.retain(|l| l.id != id);
        Ok(tables.offer_letters.len() != before)
    }

    async fn learned_working_location(&self) -> Result<Option<String>> {
        let tables = self.tables.read().await;
        let mut letters: Vec<&OfferLetter> = tables.offer_letters.iter().collect();
        letters.sort_by_key(|l| l.created_at);
        Ok(most_common_location(
            letters.iter().filter_map(|l| l.working_location.as_deref()),
        ))
    }

    async fn create_response_link(&self, candidate: &Candidate) -> Result<ResponseLink> {
        let link = ResponseLink {
            token: new_response_token(),
            candidate_id: candidate.id,
            candidate_name: full_name(&candidate.first_name, &candidate.last_name),
            created_at: Utc::now(),
            submitted_at: None,
            response: None,
        };
        self.tables.write().await.response_links.push(link.clone());
        info!("Issued response link for candidate {}", candidate.id);
        Ok(link)
    }

    async fn get_response_link(&self, token: &str) -> Result<Option<ResponseLink>> {
        let tables = self.tables.read().await;
        Ok(tables.response_links.iter().find(|l| l.token == token).cloned())
    }

    async fn submit_candidate_response(
        &self,
        token: &str,
        response: CandidateResponse,
    ) -> Result<SubmitOutcome> {
        let mut tables = self.tables.write().await;
        let Some(link) = tables.response_links.iter_mut().find(|l| l.token == token) else {
            return Ok(SubmitOutcome::UnknownToken);
        };
        if link.submitted_at.is_some() {
            warn!("Rejected repeat response for token {token}");
            return Ok(SubmitOutcome::AlreadySubmitted(link.clone()));
        }
        link.submitted_at = Some(Utc::now());
        link.response = Some(Json(response));
        Ok(SubmitOutcome::Accepted(link.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::salary::{compute_breakdown, SalarySplit};
    use chrono::NaiveDate;

    fn submission(name: &str, location: Option<&str>) -> OfferSubmission {
        OfferSubmission {
            candidate_id: None,
            candidate_name: name.to_string(),
            candidate_address: "Delhi".to_string(),
            designation: "Engineer".to_string(),
            working_location: location.map(str::to_string),
            joining_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            offer_valid_till: None,
            letter_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            annual_ctc: 1_000_000,
            salary_split: SalarySplit::Standard,
            salary_breakdown: compute_breakdown(1_000_000, SalarySplit::Standard),
            signatory_id: None,
            secondary_signatory_id: None,
            letterhead_id: None,
            template_profile_id: None,
            template_type: "standard".to_string(),
            kra_details: vec![],
        }
    }

    fn letterhead_input(name: &str, is_default: bool) -> LetterheadInput {
        LetterheadInput {
            name: name.to_string(),
            company_name: "Acme".to_string(),
            address: "Acme Towers".to_string(),
            phone: None,
            email: None,
            website: None,
            logo_image: None,
            footer_text: None,
            is_default,
        }
    }

    #[tokio::test]
    async fn test_seeded_store_has_demo_data() {
        let store = MemoryStore::seeded();
        assert_eq!(store.list_candidates().await.unwrap().len(), 3);
        assert_eq!(store.list_signatories().await.unwrap().len(), 2);
        let profiles = store.list_template_profiles().await.unwrap();
        assert_eq!(profiles.iter().filter(|p| p.is_default).count(), 1);
    }

    #[tokio::test]
    async fn test_offer_letter_crud() {
        let store = MemoryStore::default();
        let created = store
            .create_offer_letter(submission("Asha", Some("Pune")))
            .await
            .unwrap();
        assert_eq!(created.status, STATUS_GENERATED);
        assert_eq!(created.salary_breakdown.0.len(), 4);

        let mut changed = submission("Asha Verma", Some("Pune"));
        changed.annual_ctc = 2_000_000;
        let updated = store
            .update_offer_letter(created.id, changed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.annual_ctc, 2_000_000);
        assert_eq!(updated.created_at, created.created_at);

        assert!(store
            .update_offer_letter(Uuid::new_v4(), submission("x", None))
            .await
            .unwrap()
            .is_none());

        assert!(store.delete_offer_letter(created.id).await.unwrap());
        assert!(!store.delete_offer_letter(created.id).await.unwrap());
        assert!(store.get_offer_letter(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_learned_location_from_past_letters() {
        let store = MemoryStore::default();
        assert!(store.learned_working_location().await.unwrap().is_none());
        for loc in [Some("Pune"), Some("Delhi"), None, Some("Pune")] {
            store.create_offer_letter(submission("a", loc)).await.unwrap();
        }
        assert_eq!(
            store.learned_working_location().await.unwrap().as_deref(),
            Some("Pune")
        );
    }

    #[tokio::test]
    async fn test_single_default_letterhead() {
        let store = MemoryStore::default();
        let first = store.create_letterhead(letterhead_input("A", true)).await.unwrap();
        let second = store.create_letterhead(letterhead_input("B", true)).await.unwrap();

        let all = store.list_letterheads().await.unwrap();
        let defaults: Vec<_> = all.iter().filter(|l| l.is_default).map(|l| l.id).collect();
        assert_eq!(defaults, vec![second.id]);

        store
            .update_letterhead(first.id, letterhead_input("A2", true))
            .await
            .unwrap()
            .unwrap();
        let all = store.list_letterheads().await.unwrap();
        let defaults: Vec<_> = all.iter().filter(|l| l.is_default).map(|l| l.id).collect();
        assert_eq!(defaults, vec![first.id]);
    }

    #[tokio::test]
    async fn test_response_accepted_once() {
        let store = MemoryStore::seeded();
        let candidate = store.list_candidates().await.unwrap().remove(0);
        let link = store.create_response_link(&candidate).await.unwrap();
        assert_eq!(link.candidate_name, "Asha Verma");

        let response = CandidateResponse {
            interested: true,
            current_ctc: Some(900_000),
            expected_ctc: Some(1_300_000),
            notice_period_days: Some(30),
            interview_availability: None,
            remarks: None,
        };
        let first = store
            .submit_candidate_response(&link.token, response.clone())
            .await
            .unwrap();
        assert!(matches!(first, SubmitOutcome::Accepted(_)));

        let mut second_attempt = response;
        second_attempt.interested = false;
        match store
            .submit_candidate_response(&link.token, second_attempt)
            .await
            .unwrap()
        {
            SubmitOutcome::AlreadySubmitted(stored) => {
                assert!(stored.response.unwrap().0.interested, "first answer is kept");
            }
            other => panic!("expected AlreadySubmitted, got {other:?}"),
        }

        assert!(matches!(
            store
                .submit_candidate_response("missing", CandidateResponse {
                    interested: false,
                    current_ctc: None,
                    expected_ctc: None,
                    notice_period_days: None,
                    interview_availability: None,
                    remarks: None,
                })
                .await
                .unwrap(),
            SubmitOutcome::UnknownToken
        ));
    }
}
