//! Template profile selection.
//!
//! Resolution order: explicit selection (if it exists in the fetched list),
//! then the profile flagged `is_default`, then the first profile, then the
//! hard-coded fallback template. A resolved profile only changes the
//! `template_type` string in the submission; its structural flags are for display.

use serde::Serialize;
use uuid::Uuid;

use crate::models::template_profile::TemplateProfile;

/// Template type used when no profile could be resolved.
pub const FALLBACK_TEMPLATE_TYPE: &str = "standard";
/// Template type used when a learned profile steers the letter.
pub const PROFILE_TEMPLATE_TYPE: &str = "learned_profile";

#[derive(Debug, Clone, Copy)]
pub enum TemplateResolution<'a> {
    Profile(&'a TemplateProfile),
    Fallback,
}

impl<'a> TemplateResolution<'a> {
    pub fn profile(&self) -> Option<&'a TemplateProfile> {
        match self {
            TemplateResolution::Profile(p) => Some(*p),
            TemplateResolution::Fallback => None,
        }
    }

    pub fn profile_id(&self) -> Option<Uuid> {
        self.profile().map(|p| p.id)
    }

    pub fn template_type(&self) -> &'static str {
        match self {
            TemplateResolution::Profile(_) => PROFILE_TEMPLATE_TYPE,
            TemplateResolution::Fallback => FALLBACK_TEMPLATE_TYPE,
        }
    }

    pub fn summary(&self) -> TemplateSummary {
        let profile = self.profile();
        TemplateSummary {
            template_type: self.template_type().to_string(),
            profile_id: profile.map(|p| p.id),
            profile_name: profile.map(|p| p.profile_name.clone()),
            tone_style: profile.map(|p| p.tone_style.clone()),
            sections_order: profile.map(|p| p.sections_order.clone()).unwrap_or_default(),
            has_salary_table: profile.map(|p| p.has_salary_table).unwrap_or(true),
            has_kra_section: profile.map(|p| p.has_kra_section).unwrap_or(true),
        }
    }
}

/// Display-only view of the resolved template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub template_type: String,
    pub profile_id: Option<Uuid>,
    pub profile_name: Option<String>,
    pub tone_style: Option<String>,
    pub sections_order: Vec<String>,
    pub has_salary_table: bool,
    pub has_kra_section: bool,
}

/// Resolves the effective template profile.
pub fn resolve_template(
    profiles: &[TemplateProfile],
    selected: Option<Uuid>,
) -> TemplateResolution<'_> {
    selected
        .and_then(|id| profiles.iter().find(|p| p.id == id))
        .or_else(|| profiles.iter().find(|p| p.is_default))
        .or_else(|| profiles.first())
        .map(TemplateResolution::Profile)
        .unwrap_or(TemplateResolution::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, is_default: bool) -> TemplateProfile {
        TemplateProfile {
            id: Uuid::new_v4(),
            profile_name: name.to_string(),
            tone_style: "formal".to_string(),
            sections_order: vec!["salary".to_string(), "kra".to_string()],
            has_salary_table: true,
            has_kra_section: false,
            is_default,
            usage_count: 0,
        }
    }

    #[test]
    fn test_explicit_selection_wins() {
        let profiles = vec![profile("a", false), profile("b", true), profile("c", false)];
        let chosen = resolve_template(&profiles, Some(profiles[2].id));
        assert_eq!(chosen.profile_id(), Some(profiles[2].id));
        assert_eq!(chosen.template_type(), PROFILE_TEMPLATE_TYPE);
    }

    #[test]
    fn test_unknown_selection_falls_back_to_default_flag() {
        let profiles = vec![profile("a", false), profile("b", true)];
        let chosen = resolve_template(&profiles, Some(Uuid::new_v4()));
        assert_eq!(chosen.profile_id(), Some(profiles[1].id));
    }

    #[test]
    fn test_no_default_uses_first_profile() {
        let profiles = vec![profile("a", false), profile("b", false)];
        let chosen = resolve_template(&profiles, Some(Uuid::new_v4()));
        assert_eq!(chosen.profile_id(), Some(profiles[0].id));

        let chosen = resolve_template(&profiles, None);
        assert_eq!(chosen.profile_id(), Some(profiles[0].id));
    }

    #[test]
    fn test_empty_list_uses_fallback_template() {
        let chosen = resolve_template(&[], Some(Uuid::new_v4()));
        assert!(chosen.profile().is_none());
        assert_eq!(chosen.template_type(), FALLBACK_TEMPLATE_TYPE);
    }

    #[test]
    fn test_summary_surfaces_structural_flags() {
        let profiles = vec![profile("Formal tech", true)];
        let summary = resolve_template(&profiles, None).summary();
        assert_eq!(summary.profile_name.as_deref(), Some("Formal tech"));
        assert!(summary.has_salary_table);
        assert!(!summary.has_kra_section);
        assert_eq!(summary.sections_order, vec!["salary", "kra"]);

        let fallback = resolve_template(&[], None).summary();
        assert_eq!(fallback.template_type, FALLBACK_TEMPLATE_TYPE);
        assert!(fallback.sections_order.is_empty());
    }
}
