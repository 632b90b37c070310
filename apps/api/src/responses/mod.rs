//! Public candidate response links.
//!
//! A token accepts exactly one response. Later visits see the stored
//! completion message instead of the form.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::response::{CandidateResponse, ResponseLink};

pub const COMPLETION_MESSAGE: &str =
    "Thank you! Your response has been recorded. Our team will be in touch.";

pub const ALREADY_SUBMITTED_MESSAGE: &str = "Your response has already been submitted";

/// Longest notice period we accept, in days.
pub const MAX_NOTICE_PERIOD_DAYS: i32 = 365;

/// What the public page shows for a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponsePageView {
    Open {
        candidate_name: String,
    },
    AlreadySubmitted {
        message: String,
        submitted_at: DateTime<Utc>,
    },
}

impl From<&ResponseLink> for ResponsePageView {
    fn from(link: &ResponseLink) -> Self {
        match link.submitted_at {
            Some(submitted_at) => ResponsePageView::AlreadySubmitted {
                message: COMPLETION_MESSAGE.to_string(),
                submitted_at,
            },
            None => ResponsePageView::Open {
                candidate_name: link.candidate_name.clone(),
            },
        }
    }
}

/// Rejects values the form would never produce. Remarks are trimmed and dropped when blank.
pub fn validate_response(mut response: CandidateResponse) -> Result<CandidateResponse, String> {
    for (field, value) in [
        ("current_ctc", response.current_ctc),
        ("expected_ctc", response.expected_ctc),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(format!("{field} cannot be negative"));
        }
    }
    if let Some(days) = response.notice_period_days {
        if !(0..=MAX_NOTICE_PERIOD_DAYS).contains(&days) {
            return Err(format!(
                "notice_period_days must be between 0 and {MAX_NOTICE_PERIOD_DAYS}"
            ));
        }
    }
    response.remarks = response
        .remarks
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    Ok(response)
}
