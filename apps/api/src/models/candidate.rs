use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Recruitment workflow stage. Declaration order is the display order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "pipeline_stage", rename_all = "snake_case")]
pub enum PipelineStage {
    Sourced,
    Screening,
    Interview,
    Offered,
    Hired,
    Rejected,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Sourced,
        PipelineStage::Screening,
        PipelineStage::Interview,
        PipelineStage::Offered,
        PipelineStage::Hired,
        PipelineStage::Rejected,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub vacancy_title: Option<String>,
    pub vacancy_location: Option<String>,
    pub current_designation: Option<String>,
    pub experience: Option<String>,
    pub current_salary: Option<i64>,
    pub expected_salary: Option<i64>,
    pub stage: PipelineStage,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a candidate; identity and timestamps are assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCandidate {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub vacancy_title: Option<String>,
    pub vacancy_location: Option<String>,
    pub current_designation: Option<String>,
    pub experience: Option<String>,
    pub current_salary: Option<i64>,
    pub expected_salary: Option<i64>,
    pub stage: Option<PipelineStage>,
}

impl NewCandidate {
    pub fn into_candidate(self, id: Uuid, created_at: DateTime<Utc>) -> Candidate {
        Candidate {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            vacancy_title: self.vacancy_title,
            vacancy_location: self.vacancy_location,
            current_designation: self.current_designation,
            experience: self.experience,
            current_salary: self.current_salary,
            expected_salary: self.expected_salary,
            stage: self.stage.unwrap_or(PipelineStage::Sourced),
            created_at,
        }
    }
}
