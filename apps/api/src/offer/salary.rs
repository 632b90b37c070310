//! Salary breakdown: splits an annual CTC into named components.
//!
//! Each component is rounded on its own (half up), so the annual amounts can
//! drift from the input CTC by at most one unit per component. The drift is
//! left as-is; callers that display a total use `total_annual()`.

use serde::{Deserialize, Serialize};

/// One row of the salary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryComponent {
    pub name: String,
    pub per_month: i64,
    pub annual: i64,
}

/// Fixed percentage splits. Not user-configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "salary_split", rename_all = "snake_case")]
pub enum SalarySplit {
    /// Basic 40 / HRA 20 / Special 25 / Other 15.
    #[default]
    Standard,
    /// Basic 40 / HRA 20 / Special 25 / PF 12 / Medical 3.
    Statutory,
}

const STANDARD_SPLIT: &[(&str, i64)] = &[
    ("Basic Salary", 40),
    ("House Rent Allowance", 20),
    ("Special Allowance", 25),
    ("Other Allowances", 15),
];

const STATUTORY_SPLIT: &[(&str, i64)] = &[
    ("Basic Salary", 40),
    ("House Rent Allowance", 20),
    ("Special Allowance", 25),
    ("Provident Fund", 12),
    ("Medical Allowance", 3),
];

impl SalarySplit {
    /// Component names with their percent of total, in display order.
    pub fn components(self) -> &'static [(&'static str, i64)] {
        match self {
            SalarySplit::Standard => STANDARD_SPLIT,
            SalarySplit::Statutory => STATUTORY_SPLIT,
        }
    }
}

/// Computes the salary table for `annual_ctc`.
///
/// `annual = round(ctc * percent / 100)`, `per_month = round(annual / 12)`.
/// Zero or negative CTC yields all-zero components.
pub fn compute_breakdown(annual_ctc: i64, split: SalarySplit) -> Vec<SalaryComponent> {
    let ctc = annual_ctc.max(0);

    split
        .components()
        .iter()
        .map(|&(name, percent)| {
            let annual = round_div(i128::from(ctc) * i128::from(percent), 100);
            SalaryComponent {
                name: name.to_string(),
                per_month: round_div(i128::from(annual), 12),
                annual,
            }
        })
        .collect()
}

/// Sum of the annual column. May differ from the input CTC by rounding drift.
pub fn total_annual(components: &[SalaryComponent]) -> i64 {
    components.iter().map(|c| c.annual).sum()
}

/// Sum of the monthly column.
pub fn total_per_month(components: &[SalaryComponent]) -> i64 {
    components.iter().map(|c| c.per_month).sum()
}

/// Half-up integer division for non-negative numerators.
fn round_div(numerator: i128, denominator: i128) -> i64 {
    let rounded = (numerator + denominator / 2) / denominator;
    i64::try_from(rounded).unwrap_or(i64::MAX)
}
