use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A person authorised to sign generated letters.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signatory {
    pub id: Uuid,
    pub name: String,
    pub position: String,
    pub signature_image: Option<String>,
    pub stamp_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Letterhead {
    pub id: Uuid,
    pub name: String,
    pub company_name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_image: Option<String>,
    pub footer_text: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable letterhead fields, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterheadInput {
    pub name: String,
    pub company_name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_image: Option<String>,
    pub footer_text: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}
