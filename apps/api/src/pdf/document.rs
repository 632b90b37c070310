//! Letter layout: turns a stored offer letter into ordered paragraph/table blocks.
//!
//! The external renderer only typesets; every word and every number in the
//! PDF is decided here.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::company::{Letterhead, Signatory};
use crate::models::offer_letter::OfferLetter;
use crate::models::template_profile::TemplateProfile;
use crate::offer::salary::{total_annual, total_per_month};

// ────────────────────────────────────────────────────────────────────────────
// Document model (wire format for the renderer)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LetterDocument {
    pub title: String,
    pub letterhead: Option<LetterheadBlock>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterheadBlock {
    pub company_name: String,
    pub address: String,
    pub contact_line: Option<String>,
    pub logo_image: Option<String>,
    pub footer_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        total_row: Option<Vec<String>>,
    },
    BulletList {
        items: Vec<String>,
    },
    Signatures {
        signers: Vec<SignerBlock>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignerBlock {
    pub name: String,
    pub position: String,
    pub signature_image: Option<String>,
    pub stamp_image: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterSection {
    Greeting,
    Position,
    Compensation,
    Responsibilities,
    Terms,
    Closing,
}

const DEFAULT_ORDER: [LetterSection; 6] = [
    LetterSection::Greeting,
    LetterSection::Position,
    LetterSection::Compensation,
    LetterSection::Responsibilities,
    LetterSection::Terms,
    LetterSection::Closing,
];

impl LetterSection {
    /// Maps a learned section name onto a known section. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "greeting" | "salutation" | "introduction" => Some(LetterSection::Greeting),
            "position" | "appointment" | "designation" => Some(LetterSection::Position),
            "compensation" | "salary" | "salary_table" | "ctc" => Some(LetterSection::Compensation),
            "responsibilities" | "kra" | "kras" | "kra_section" => {
                Some(LetterSection::Responsibilities)
            }
            "terms" | "conditions" | "terms_and_conditions" => Some(LetterSection::Terms),
            "closing" | "acceptance" | "signature" | "signatures" => Some(LetterSection::Closing),
            _ => None,
        }
    }
}

/// Section order for a letter: the profile's order first, then any known
/// section it left out, in default order. Without a profile, the default order.
pub fn section_order(profile: Option<&TemplateProfile>) -> Vec<LetterSection> {
    let mut order: Vec<LetterSection> = Vec::with_capacity(DEFAULT_ORDER.len());
    for section in profile
        .into_iter()
        .flat_map(|p| p.sections_order.iter())
        .filter_map(|name| LetterSection::from_name(name))
        .chain(DEFAULT_ORDER)
    {
        if !order.contains(&section) {
            order.push(section);
        }
    }
    order
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Inputs resolved by the caller from the store.
pub struct LetterInputs<'a> {
    pub letter: &'a OfferLetter,
    pub letterhead: Option<&'a Letterhead>,
    pub signatories: Vec<&'a Signatory>,
    pub profile: Option<&'a TemplateProfile>,
}

pub fn compose_letter(inputs: &LetterInputs<'_>) -> LetterDocument {
    let letter = inputs.letter;
    let friendly = inputs
        .profile
        .map(|p| p.tone_style.eq_ignore_ascii_case("friendly"))
        .unwrap_or(false);
    let include_salary_table = inputs.profile.map(|p| p.has_salary_table).unwrap_or(true);
    let include_kras = inputs.profile.map(|p| p.has_kra_section).unwrap_or(true);
    let company = inputs
        .letterhead
        .map(|l| l.company_name.as_str())
        .unwrap_or("the Company");

    let mut blocks = vec![
        Block::Paragraph {
            text: format!("Date: {}", format_date(letter.letter_date)),
        },
        Block::Paragraph {
            text: format!("To,\n{}\n{}", letter.candidate_name, letter.candidate_address),
        },
        Block::Heading {
            text: format!("Offer of Employment: {}", letter.designation),
        },
    ];

    for section in section_order(inputs.profile) {
        match section {
            LetterSection::Greeting => blocks.push(Block::Paragraph {
                text: if friendly {
                    format!("Hi {},", letter.candidate_name)
                } else {
                    format!("Dear {},", letter.candidate_name)
                },
            }),
            LetterSection::Position => {
                let mut text = format!(
                    "We are pleased to offer you the position of {} at {}. Your date of joining will be {}.",
                    letter.designation,
                    company,
                    format_date(letter.joining_date)
                );
                if let Some(location) = letter.working_location.as_deref() {
                    text.push_str(&format!(" Your place of work will be {location}."));
                }
                blocks.push(Block::Paragraph { text });
            }
            LetterSection::Compensation => {
                blocks.push(Block::Heading {
                    text: "Compensation".to_string(),
                });
                blocks.push(Block::Paragraph {
                    text: format!(
                        "Your annual Cost to Company (CTC) will be INR {}.",
                        format_inr(letter.annual_ctc)
                    ),
                });
                if include_salary_table && !letter.salary_breakdown.is_empty() {
                    blocks.push(salary_table(letter));
                }
            }
            LetterSection::Responsibilities => {
                if include_kras && !letter.kra_details.is_empty() {
                    blocks.push(Block::Heading {
                        text: "Key Responsibility Areas".to_string(),
                    });
                    blocks.push(Block::BulletList {
                        items: letter.kra_details.clone(),
                    });
                }
            }
            LetterSection::Terms => {
                let mut text = String::from(
                    "This offer is subject to satisfactory verification of your documents and references.",
                );
                if let Some(valid_till) = letter.offer_valid_till {
                    text.push_str(&format!(
                        " This offer is valid until {}.",
                        format_date(valid_till)
                    ));
                }
                blocks.push(Block::Paragraph { text });
            }
            LetterSection::Closing => {
                blocks.push(Block::Paragraph {
                    text: "Please sign and return a copy of this letter as a token of your acceptance."
                        .to_string(),
                });
                blocks.push(Block::Paragraph {
                    text: if friendly { "Warm regards," } else { "Yours sincerely," }.to_string(),
                });
                if !inputs.signatories.is_empty() {
                    blocks.push(Block::Signatures {
                        signers: inputs
                            .signatories
                            .iter()
                            .map(|s| SignerBlock {
                                name: s.name.clone(),
                                position: s.position.clone(),
                                signature_image: s.signature_image.clone(),
                                stamp_image: s.stamp_image.clone(),
                            })
                            .collect(),
                    });
                }
            }
        }
    }

    LetterDocument {
        title: format!("Offer Letter - {}", letter.candidate_name),
        letterhead: inputs.letterhead.map(|l| LetterheadBlock {
            company_name: l.company_name.clone(),
            address: l.address.clone(),
            contact_line: contact_line(l),
            logo_image: l.logo_image.clone(),
            footer_text: l.footer_text.clone(),
        }),
        blocks,
    }
}

fn salary_table(letter: &OfferLetter) -> Block {
    let rows = letter
        .salary_breakdown
        .iter()
        .map(|c| vec![c.name.clone(), format_inr(c.per_month), format_inr(c.annual)])
        .collect();
    Block::Table {
        columns: vec![
            "Component".to_string(),
            "Per Month (INR)".to_string(),
            "Annual (INR)".to_string(),
        ],
        rows,
        total_row: Some(vec![
            "Total".to_string(),
            format_inr(total_per_month(&letter.salary_breakdown)),
            format_inr(total_annual(&letter.salary_breakdown)),
        ]),
    }
}

fn contact_line(letterhead: &Letterhead) -> Option<String> {
    let parts: Vec<&str> = [&letterhead.phone, &letterhead.email, &letterhead.website]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.trim().is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" | "))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

/// Formats an amount with Indian digit grouping: 1200000 -> "12,00,000".
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };
    if digits.len() <= 3 {
        return format!("{sign}{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{sign}{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::salary::{compute_breakdown, SalarySplit};
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn letter() -> OfferLetter {
        OfferLetter {
            id: Uuid::new_v4(),
            candidate_id: None,
            candidate_name: "Asha Verma".to_string(),
            candidate_address: "Delhi, 110017".to_string(),
            designation: "Backend Engineer".to_string(),
            working_location: Some("Bengaluru".to_string()),
            joining_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            offer_valid_till: NaiveDate::from_ymd_opt(2026, 3, 8),
            letter_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            annual_ctc: 1_200_000,
            salary_split: SalarySplit::Standard,
            salary_breakdown: Json(compute_breakdown(1_200_000, SalarySplit::Standard)),
            signatory_id: None,
            secondary_signatory_id: None,
            letterhead_id: None,
            template_profile_id: None,
            template_type: "standard".to_string(),
            kra_details: vec!["Own the payments service".to_string()],
            status: "generated".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(order: &[&str], salary: bool, kra: bool, tone: &str) -> TemplateProfile {
        TemplateProfile {
            id: Uuid::new_v4(),
            profile_name: "p".to_string(),
            tone_style: tone.to_string(),
            sections_order: order.iter().map(|s| s.to_string()).collect(),
            has_salary_table: salary,
            has_kra_section: kra,
            is_default: true,
            usage_count: 0,
        }
    }

    #[test]
    fn test_format_inr_indian_grouping() {
        assert_eq!(format_inr(0), "0");
        assert_eq!(format_inr(999), "999");
        assert_eq!(format_inr(1_000), "1,000");
        assert_eq!(format_inr(40_000), "40,000");
        assert_eq!(format_inr(480_000), "4,80,000");
        assert_eq!(format_inr(1_200_000), "12,00,000");
        assert_eq!(format_inr(123_456_789), "12,34,56,789");
        assert_eq!(format_inr(-150_000), "-1,50,000");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(
            format_date(NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()),
            "08 March 2026"
        );
    }

    #[test]
    fn test_section_order_default_without_profile() {
        assert_eq!(section_order(None), DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn test_section_order_follows_profile_then_appends_missing() {
        let p = profile(&["KRA", "salary", "unknown", "kra"], true, true, "formal");
        let order = section_order(Some(&p));
        assert_eq!(order[0], LetterSection::Responsibilities);
        assert_eq!(order[1], LetterSection::Compensation);
        assert_eq!(order[2], LetterSection::Greeting);
        assert_eq!(order.len(), DEFAULT_ORDER.len());
    }

    #[test]
    fn test_compose_includes_salary_table_with_totals() {
        let l = letter();
        let doc = compose_letter(&LetterInputs {
            letter: &l,
            letterhead: None,
            signatories: vec![],
            profile: None,
        });
        let table = doc
            .blocks
            .iter()
            .find_map(|b| match b {
                Block::Table { rows, total_row, .. } => Some((rows.clone(), total_row.clone())),
                _ => None,
            })
            .expect("salary table present");
        assert_eq!(table.0.len(), 4);
        assert_eq!(table.0[0], vec!["Basic Salary", "40,000", "4,80,000"]);
        assert_eq!(table.1.unwrap(), vec!["Total", "1,00,000", "12,00,000"]);
        assert!(doc
            .blocks
            .iter()
            .any(|b| matches!(b, Block::BulletList { items } if items.len() == 1)));
        assert!(!doc.blocks.iter().any(|b| matches!(b, Block::Signatures { .. })));
    }

    #[test]
    fn test_profile_flags_drop_table_and_kras() {
        let l = letter();
        let p = profile(&[], false, false, "friendly");
        let doc = compose_letter(&LetterInputs {
            letter: &l,
            letterhead: None,
            signatories: vec![],
            profile: Some(&p),
        });
        assert!(!doc.blocks.iter().any(|b| matches!(b, Block::Table { .. })));
        assert!(!doc.blocks.iter().any(|b| matches!(b, Block::BulletList { .. })));
        assert!(doc
            .blocks
            .contains(&Block::Paragraph { text: "Hi Asha Verma,".to_string() }));
    }

    #[test]
    fn test_signatures_and_letterhead() {
        let l = letter();
        let now = Utc::now();
        let head = Letterhead {
            id: Uuid::new_v4(),
            name: "Main".to_string(),
            company_name: "Northwind".to_string(),
            address: "MG Road".to_string(),
            phone: Some("123".to_string()),
            email: None,
            website: Some("https://nw.example".to_string()),
            logo_image: None,
            footer_text: None,
            is_default: true,
            created_at: now,
            updated_at: now,
        };
        let signer = Signatory {
            id: Uuid::new_v4(),
            name: "Arjun Mehta".to_string(),
            position: "Managing Director".to_string(),
            signature_image: Some("sig.png".to_string()),
            stamp_image: None,
        };
        let doc = compose_letter(&LetterInputs {
            letter: &l,
            letterhead: Some(&head),
            signatories: vec![&signer],
            profile: None,
        });
        let letterhead = doc.letterhead.unwrap();
        assert_eq!(letterhead.contact_line.as_deref(), Some("123 | https://nw.example"));
        assert!(doc.blocks.iter().any(|b| matches!(
            b,
            Block::Paragraph { text } if text.contains("position of Backend Engineer at Northwind")
        )));
        assert!(doc
            .blocks
            .iter()
            .any(|b| matches!(b, Block::Signatures { signers } if signers[0].name == "Arjun Mehta")));
    }
}
