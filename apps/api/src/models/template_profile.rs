use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A previously learned offer-letter pattern. Read-only from this service's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateProfile {
    pub id: Uuid,
    pub profile_name: String,
    pub tone_style: String,
    pub sections_order: Vec<String>,
    pub has_salary_table: bool,
    pub has_kra_section: bool,
    pub is_default: bool,
    pub usage_count: i32,
}
