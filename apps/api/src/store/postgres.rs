//! PostgreSQL store. Backs `DATA_SOURCE=postgres`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::candidate::{Candidate, NewCandidate, PipelineStage};
use crate::models::company::{Letterhead, LetterheadInput, Signatory};
use crate::models::offer_letter::{OfferLetter, STATUS_GENERATED};
use crate::models::response::{CandidateResponse, ResponseLink};
use crate::models::template_profile::TemplateProfile;
use crate::offer::draft::{full_name, OfferSubmission};
use crate::store::{new_response_token, HrStore, SubmitOutcome};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HrStore for PgStore {
    async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        Ok(
            sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(
            sqlx::query_as::<_, Candidate>("SELECT * FROM candidates ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn insert_candidates(&self, candidates: Vec<NewCandidate>) -> Result<Vec<Candidate>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(candidates.len());
        for c in candidates {
            let row = sqlx::query_as::<_, Candidate>(
                r#"
                INSERT INTO candidates
                    (id, first_name, last_name, email, phone, address, city, state, postal_code,
                     vacancy_title, vacancy_location, current_designation, experience,
                     current_salary, expected_salary, stage)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&c.first_name)
            .bind(&c.last_name)
            .bind(&c.email)
            .bind(&c.phone)
            .bind(&c.address)
            .bind(&c.city)
            .bind(&c.state)
            .bind(&c.postal_code)
            .bind(&c.vacancy_title)
            .bind(&c.vacancy_location)
            .bind(&c.current_designation)
            .bind(&c.experience)
            .bind(c.current_salary)
            .bind(c.expected_salary)
            .bind(c.stage.unwrap_or(PipelineStage::Sourced))
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }
        tx.commit().await?;
        info!("Inserted {} candidates", inserted.len());
        Ok(inserted)
    }

    async fn set_candidate_stage(&self, id: Uuid, stage: PipelineStage) -> Result<Option<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            "UPDATE candidates SET stage = $1 WHERE id = $2 RETURNING *",
        )
        .bind(stage)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_signatories(&self) -> Result<Vec<Signatory>> {
        Ok(
            sqlx::query_as::<_, Signatory>("SELECT * FROM signatories ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn list_letterheads(&self) -> Result<Vec<Letterhead>> {
        Ok(
            sqlx::query_as::<_, Letterhead>("SELECT * FROM letterheads ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn get_letterhead(&self, id: Uuid) -> Result<Option<Letterhead>> {
        Ok(
            sqlx::query_as::<_, Letterhead>("SELECT * FROM letterheads WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_letterhead(&self, input: LetterheadInput) -> Result<Letterhead> {
        let mut tx = self.pool.begin().await?;
        if input.is_default {
            sqlx::query("UPDATE letterheads SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, Letterhead>(
            r#"
            INSERT INTO letterheads
                (id, name, company_name, address, phone, email, website, logo_image,
                 footer_text, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.company_name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.website)
        .bind(&input.logo_image)
        .bind(&input.footer_text)
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        info!("Created letterhead {}", row.id);
        Ok(row)
    }

    async fn update_letterhead(&self, id: Uuid, input: LetterheadInput) -> Result<Option<Letterhead>> {
        let mut tx = self.pool.begin().await?;
        if input.is_default {
            sqlx::query("UPDATE letterheads SET is_default = FALSE WHERE is_default AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let row = sqlx::query_as::<_, Letterhead>(
            r#"
            UPDATE letterheads
            SET name = $2, company_name = $3, address = $4, phone = $5, email = $6,
                website = $7, logo_image = $8, footer_text = $9, is_default = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.company_name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.website)
        .bind(&input.logo_image)
        .bind(&input.footer_text)
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_letterhead(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM letterheads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_template_profiles(&self) -> Result<Vec<TemplateProfile>> {
        Ok(sqlx::query_as::<_, TemplateProfile>(
            "SELECT * FROM template_profiles ORDER BY usage_count DESC, profile_name ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_offer_letters(&self) -> Result<Vec<OfferLetter>> {
        Ok(
            sqlx::query_as::<_, OfferLetter>("SELECT * FROM offer_letters ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn get_offer_letter(&self, id: Uuid) -> Result<Option<OfferLetter>> {
        Ok(
            sqlx::query_as::<_, OfferLetter>("SELECT * FROM offer_letters WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_offer_letter(&self, submission: OfferSubmission) -> Result<OfferLetter> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, OfferLetter>(
            r#"
            INSERT INTO offer_letters
                (id, candidate_id, candidate_name, candidate_address, designation,
                 working_location, joining_date, offer_valid_till, letter_date, annual_ctc,
                 salary_breakdown, signatory_id, secondary_signatory_id, letterhead_id,
                 template_profile_id, template_type, kra_details, status, salary_split)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                    $19)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(submission.candidate_id)
        .bind(&submission.candidate_name)
        .bind(&submission.candidate_address)
        .bind(&submission.designation)
        .bind(&submission.working_location)
        .bind(submission.joining_date)
        .bind(submission.offer_valid_till)
        .bind(submission.letter_date)
        .bind(submission.annual_ctc)
        .bind(Json(&submission.salary_breakdown))
        .bind(submission.signatory_id)
        .bind(submission.secondary_signatory_id)
        .bind(submission.letterhead_id)
        .bind(submission.template_profile_id)
        .bind(&submission.template_type)
        .bind(&submission.kra_details)
        .bind(STATUS_GENERATED)
        .bind(submission.salary_split)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(profile_id) = submission.template_profile_id {
            sqlx::query("UPDATE template_profiles SET usage_count = usage_count + 1 WHERE id = $1")
                .bind(profile_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Created offer letter {} for {}", row.id, row.candidate_name);
        Ok(row)
    }

    async fn update_offer_letter(
        &self,
        id: Uuid,
        submission: OfferSubmission,
    ) -> Result<Option<OfferLetter>> {
        let row = sqlx::query_as::<_, OfferLetter>(
            r#"
            UPDATE offer_letters
            SET candidate_id = $2, candidate_name = $3, candidate_address = $4,
                designation = $5, working_location = $6, joining_date = $7,
                offer_valid_till = $8, letter_date = $9, annual_ctc = $10,
                salary_breakdown = $11, signatory_id = $12, secondary_signatory_id = $13,
                letterhead_id = $14, template_profile_id = $15, template_type = $16,
                kra_details = $17, salary_split = $18, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(submission.candidate_id)
        .bind(&submission.candidate_name)
        .bind(&submission.candidate_address)
        .bind(&submission.designation)
        .bind(&submission.working_location)
        .bind(submission.joining_date)
        .bind(submission.offer_valid_till)
        .bind(submission.letter_date)
        .bind(submission.annual_ctc)
        .bind(Json(&submission.salary_breakdown))
        .bind(submission.signatory_id)
        .bind(submission.secondary_signatory_id)
        .bind(submission.letterhead_id)
        .bind(submission.template_profile_id)
        .bind(&submission.template_type)
        .bind(&submission.kra_details)
        .bind(submission.salary_split)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            info!("Updated offer letter {id}");
        }
        Ok(row)
    }

    async fn delete_offer_letter(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM offer_letters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn learned_working_location(&self) -> Result<Option<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"
            SELECT btrim(working_location)
            FROM offer_letters
            WHERE working_location IS NOT NULL AND btrim(working_location) <> ''
            GROUP BY btrim(working_location)
            ORDER BY COUNT(*) DESC, MAX(created_at) DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_response_link(&self, candidate: &Candidate) -> Result<ResponseLink> {
        let row = sqlx::query_as::<_, ResponseLink>(
            r#"
            INSERT INTO response_links (token, candidate_id, candidate_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new_response_token())
        .bind(candidate.id)
        .bind(full_name(&candidate.first_name, &candidate.last_name))
        .fetch_one(&self.pool)
        .await?;
        info!("Issued response link for candidate {}", candidate.id);
        Ok(row)
    }

    async fn get_response_link(&self, token: &str) -> Result<Option<ResponseLink>> {
        Ok(
            sqlx::query_as::<_, ResponseLink>("SELECT * FROM response_links WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn submit_candidate_response(
        &self,
        token: &str,
        response: CandidateResponse,
    ) -> Result<SubmitOutcome> {
        // Conditional UPDATE: only the first submission can flip submitted_at.
        let accepted = sqlx::query_as::<_, ResponseLink>(
            r#"
            UPDATE response_links
            SET submitted_at = now(), response = $2
            WHERE token = $1 AND submitted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(Json(&response))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(link) = accepted {
            return Ok(SubmitOutcome::Accepted(link));
        }

        match self.get_response_link(token).await? {
            Some(link) => {
                warn!("Rejected repeat response for token {token}");
                Ok(SubmitOutcome::AlreadySubmitted(link))
            }
            None => Ok(SubmitOutcome::UnknownToken),
        }
    }
}
