//! Company identity used on letters: letterheads and signatories.

pub mod handlers;

use crate::models::company::LetterheadInput;

/// Normalises a letterhead edit and rejects it when a required field is blank.
///
/// Blank optional fields are stored as `None` so the letter layout can skip them.
pub fn validate_letterhead(mut input: LetterheadInput) -> Result<LetterheadInput, String> {
    let mut missing = Vec::new();
    for (field, value) in [
        ("name", &mut input.name),
        ("company_name", &mut input.company_name),
        ("address", &mut input.address),
    ] {
        *value = value.trim().to_string();
        if value.is_empty() {
            missing.push(field);
        }
    }
    if !missing.is_empty() {
        return Err(format!(
            "Please fill in the required fields: {}",
            missing.join(", ")
        ));
    }

    for optional in [
        &mut input.phone,
        &mut input.email,
        &mut input.website,
        &mut input.logo_image,
        &mut input.footer_text,
    ] {
        *optional = optional
            .take()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
    }
    Ok(input)
}
