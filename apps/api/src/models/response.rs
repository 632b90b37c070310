use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewAvailability {
    Weekdays,
    Weekends,
    Anytime,
}

/// What a candidate tells us through the public response link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub interested: bool,
    pub current_ctc: Option<i64>,
    pub expected_ctc: Option<i64>,
    pub notice_period_days: Option<i32>,
    pub interview_availability: Option<InterviewAvailability>,
    pub remarks: Option<String>,
}

/// A tokenized response link. `submitted_at` is set exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponseLink {
    pub token: String,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub response: Option<Json<CandidateResponse>>,
}
