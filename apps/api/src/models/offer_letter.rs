use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::offer::salary::{SalaryComponent, SalarySplit};

/// Status assigned by the service when a letter is first stored.
pub const STATUS_GENERATED: &str = "generated";

/// A persisted offer letter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferLetter {
    pub id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    pub candidate_address: String,
    pub designation: String,
    pub working_location: Option<String>,
    pub joining_date: NaiveDate,
    pub offer_valid_till: Option<NaiveDate>,
    pub letter_date: NaiveDate,
    pub annual_ctc: i64,
    /// Which fixed split produced `salary_breakdown`.
    pub salary_split: SalarySplit,
    pub salary_breakdown: Json<Vec<SalaryComponent>>,
    pub signatory_id: Option<Uuid>,
    pub secondary_signatory_id: Option<Uuid>,
    pub letterhead_id: Option<Uuid>,
    pub template_profile_id: Option<Uuid>,
    pub template_type: String,
    pub kra_details: Vec<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
