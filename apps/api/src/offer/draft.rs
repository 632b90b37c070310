//! Offer letter draft builder.
//!
//! Two shapes of the same letter live here:
//! - `OfferLetterForm`: every field optional, merged patch-by-patch while the user edits.
//! - `OfferSubmission`: the validated, submission-ready letter. The only way to get one
//!   is `OfferLetterForm::validate`, which also recomputes the salary breakdown from the
//!   final CTC so the stored table always matches the stored CTC.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::candidate::Candidate;
use crate::models::company::{Letterhead, Signatory};
use crate::offer::salary::{compute_breakdown, SalaryComponent, SalarySplit};
use crate::offer::template::TemplateResolution;

pub const ADDRESS_FALLBACK: &str = "Address not provided";
pub const DESIGNATION_FALLBACK: &str = "Associate";

/// Case-insensitive position markers that identify a director-like signatory.
const DIRECTOR_MARKERS: &[&str] = &["director", "ceo", "managing"];

// ────────────────────────────────────────────────────────────────────────────
// Form state
// ────────────────────────────────────────────────────────────────────────────

/// In-progress offer letter. `merge` applies a partial update on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferLetterForm {
    pub candidate_id: Option<Uuid>,
    pub candidate_name: Option<String>,
    pub candidate_address: Option<String>,
    pub designation: Option<String>,
    pub working_location: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub offer_valid_till: Option<NaiveDate>,
    pub letter_date: Option<NaiveDate>,
    pub annual_ctc: Option<i64>,
    pub salary_split: Option<SalarySplit>,
    /// Preview only. Never trusted on submission.
    pub salary_breakdown: Option<Vec<SalaryComponent>>,
    pub signatory_id: Option<Uuid>,
    pub secondary_signatory_id: Option<Uuid>,
    pub letterhead_id: Option<Uuid>,
    pub template_profile_id: Option<Uuid>,
    pub kra_details: Option<Vec<String>>,
}

impl OfferLetterForm {
    /// Shallow merge: every field present in `patch` replaces the current value.
    /// The breakdown preview is re-derived whenever CTC or split is touched.
    pub fn merge(&mut self, patch: OfferLetterForm) {
        let ctc_touched = patch.annual_ctc.is_some() || patch.salary_split.is_some();

        replace_if_set(&mut self.candidate_id, patch.candidate_id);
        replace_if_set(&mut self.candidate_name, patch.candidate_name);
        replace_if_set(&mut self.candidate_address, patch.candidate_address);
        replace_if_set(&mut self.designation, patch.designation);
        replace_if_set(&mut self.working_location, patch.working_location);
        replace_if_set(&mut self.joining_date, patch.joining_date);
        replace_if_set(&mut self.offer_valid_till, patch.offer_valid_till);
        replace_if_set(&mut self.letter_date, patch.letter_date);
        replace_if_set(&mut self.annual_ctc, patch.annual_ctc);
        replace_if_set(&mut self.salary_split, patch.salary_split);
        replace_if_set(&mut self.signatory_id, patch.signatory_id);
        replace_if_set(&mut self.secondary_signatory_id, patch.secondary_signatory_id);
        replace_if_set(&mut self.letterhead_id, patch.letterhead_id);
        replace_if_set(&mut self.template_profile_id, patch.template_profile_id);
        replace_if_set(&mut self.kra_details, patch.kra_details);

        if ctc_touched {
            self.refresh_breakdown();
        }
    }

    /// Recomputes the preview table. Zero CTC clears it rather than showing a zero table.
    pub fn refresh_breakdown(&mut self) {
        self.salary_breakdown = match self.annual_ctc {
            Some(ctc) if ctc > 0 => Some(compute_breakdown(ctc, self.salary_split.unwrap_or_default())),
            _ => None,
        };
    }

    /// Validates required fields and produces the submission payload.
    ///
    /// Required: candidate name, designation, joining date, CTC > 0.
    /// All missing fields are reported together.
    pub fn validate(
        &self,
        template: &TemplateResolution<'_>,
        today: NaiveDate,
    ) -> Result<OfferSubmission, DraftValidationError> {
        let candidate_name = non_empty(self.candidate_name.as_deref());
        let designation = non_empty(self.designation.as_deref());
        let annual_ctc = self.annual_ctc.filter(|ctc| *ctc > 0);

        let mut missing = Vec::new();
        if candidate_name.is_none() {
            missing.push("candidate name");
        }
        if designation.is_none() {
            missing.push("designation");
        }
        if self.joining_date.is_none() {
            missing.push("joining date");
        }
        if annual_ctc.is_none() {
            missing.push("annual CTC (must be greater than zero)");
        }

        let (Some(candidate_name), Some(designation), Some(joining_date), Some(annual_ctc)) =
            (candidate_name, designation, self.joining_date, annual_ctc)
        else {
            return Err(DraftValidationError::MissingFields(missing));
        };

        let letter_date = self.letter_date.unwrap_or(today);
        if let Some(valid_till) = self.offer_valid_till {
            if valid_till < letter_date {
                return Err(DraftValidationError::ValidityBeforeLetterDate {
                    valid_till,
                    letter_date,
                });
            }
        }

        let salary_split = self.salary_split.unwrap_or_default();

        Ok(OfferSubmission {
            candidate_id: self.candidate_id,
            candidate_name: candidate_name.to_string(),
            candidate_address: non_empty(self.candidate_address.as_deref())
                .unwrap_or(ADDRESS_FALLBACK)
                .to_string(),
            designation: designation.to_string(),
            working_location: non_empty(self.working_location.as_deref()).map(str::to_string),
            joining_date,
            offer_valid_till: self.offer_valid_till,
            letter_date,
            annual_ctc,
            salary_split,
            salary_breakdown: compute_breakdown(annual_ctc, salary_split),
            signatory_id: self.signatory_id,
            secondary_signatory_id: self.secondary_signatory_id,
            letterhead_id: self.letterhead_id,
            template_profile_id: template.profile_id(),
            template_type: template.template_type().to_string(),
            kra_details: self
                .kra_details
                .iter()
                .flatten()
                .filter_map(|k| non_empty(Some(k.as_str())))
                .map(str::to_string)
                .collect(),
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftValidationError {
    #[error("Please fill in the required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Offer validity date {valid_till} is before the letter date {letter_date}")]
    ValidityBeforeLetterDate {
        valid_till: NaiveDate,
        letter_date: NaiveDate,
    },

    #[error("The draft refers to records that do not exist: {}", .0.join(", "))]
    UnknownReferences(Vec<&'static str>),
}

// ────────────────────────────────────────────────────────────────────────────
// Submission payload
// ────────────────────────────────────────────────────────────────────────────

/// A validated offer letter, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSubmission {
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_address: String,
    pub designation: String,
    pub working_location: Option<String>,
    pub joining_date: NaiveDate,
    pub offer_valid_till: Option<NaiveDate>,
    pub letter_date: NaiveDate,
    pub annual_ctc: i64,
    pub salary_split: SalarySplit,
    pub salary_breakdown: Vec<SalaryComponent>,
    pub signatory_id: Option<Uuid>,
    pub secondary_signatory_id: Option<Uuid>,
    pub letterhead_id: Option<Uuid>,
    pub template_profile_id: Option<Uuid>,
    pub template_type: String,
    pub kra_details: Vec<String>,
}

impl OfferSubmission {
    /// Checks every referenced signatory, letterhead and candidate against what the store holds.
    pub fn check_references(
        &self,
        signatories: &[Signatory],
        letterheads: &[Letterhead],
        candidate_exists: bool,
    ) -> Result<(), DraftValidationError> {
        let known_signatory =
            |id: Option<Uuid>| id.map_or(true, |id| signatories.iter().any(|s| s.id == id));

        let mut unknown = Vec::new();
        if self.candidate_id.is_some() && !candidate_exists {
            unknown.push("candidate");
        }
        if !known_signatory(self.signatory_id) {
            unknown.push("signatory");
        }
        if !known_signatory(self.secondary_signatory_id) {
            unknown.push("secondary signatory");
        }
        if let Some(id) = self.letterhead_id {
            if !letterheads.iter().any(|l| l.id == id) {
                unknown.push("letterhead");
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(DraftValidationError::UnknownReferences(unknown))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Prefill
// ────────────────────────────────────────────────────────────────────────────

/// Everything the prefill needs besides the candidate.
pub struct PrefillContext<'a> {
    pub signatories: &'a [Signatory],
    pub letterheads: &'a [Letterhead],
    pub template: TemplateResolution<'a>,
    /// Most common working location among past letters, if any.
    pub learned_location: Option<&'a str>,
    pub company_address: &'a str,
    pub today: NaiveDate,
    pub offer_validity_days: i64,
}

/// Builds a pre-filled form from a candidate record.
pub fn prefill_form(candidate: &Candidate, ctx: &PrefillContext<'_>) -> OfferLetterForm {
    let designation = non_empty(candidate.vacancy_title.as_deref())
        .or_else(|| non_empty(candidate.current_designation.as_deref()))
        .unwrap_or(DESIGNATION_FALLBACK);

    let working_location = non_empty(candidate.vacancy_location.as_deref())
        .or_else(|| non_empty(ctx.learned_location))
        .unwrap_or(ctx.company_address);

    let annual_ctc = candidate
        .expected_salary
        .filter(|s| *s > 0)
        .or(candidate.current_salary.filter(|s| *s > 0));

    let signatory_id = find_director(ctx.signatories)
        .or_else(|| ctx.signatories.first())
        .map(|s| s.id);

    let letterhead_id = ctx
        .letterheads
        .iter()
        .find(|l| l.is_default)
        .or_else(|| ctx.letterheads.first())
        .map(|l| l.id);

    let mut form = OfferLetterForm {
        candidate_id: Some(candidate.id),
        candidate_name: Some(full_name(&candidate.first_name, &candidate.last_name)),
        candidate_address: Some(join_address(&[
            candidate.address.as_deref().unwrap_or_default(),
            candidate.city.as_deref().unwrap_or_default(),
            candidate.state.as_deref().unwrap_or_default(),
            candidate.postal_code.as_deref().unwrap_or_default(),
        ])),
        designation: Some(designation.to_string()),
        working_location: Some(working_location.to_string()),
        joining_date: None,
        offer_valid_till: Duration::try_days(ctx.offer_validity_days)
            .and_then(|validity| ctx.today.checked_add_signed(validity)),
        letter_date: Some(ctx.today),
        annual_ctc,
        salary_split: Some(SalarySplit::default()),
        salary_breakdown: None,
        signatory_id,
        secondary_signatory_id: None,
        letterhead_id,
        template_profile_id: ctx.template.profile_id(),
        kra_details: Some(Vec::new()),
    };
    form.refresh_breakdown();
    form
}

/// First and last name joined by a single space, blanks dropped.
pub fn full_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins the non-empty address parts with ", ".
pub fn join_address<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        ADDRESS_FALLBACK.to_string()
    } else {
        joined
    }
}

/// First signatory whose position reads like a director, CEO or managing role.
pub fn find_director(signatories: &[Signatory]) -> Option<&Signatory> {
    signatories.iter().find(|s| {
        let position = s.position.to_lowercase();
        DIRECTOR_MARKERS.iter().any(|m| position.contains(m))
    })
}

fn replace_if_set<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
