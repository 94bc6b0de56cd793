//! Dividend domain types.

use chrono::NaiveDate;
use ikimina_shared::types::{DividendRunId, MemberId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity a dividend is proportioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividendBasis {
    /// Member share count.
    Shares,
    /// Sum of the member's contributions.
    Contributions,
}

impl DividendBasis {
    /// Returns the string representation of the basis.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shares => "shares",
            Self::Contributions => "contributions",
        }
    }

    /// Parses a basis from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shares" => Some(Self::Shares),
            "contributions" => Some(Self::Contributions),
            _ => None,
        }
    }
}

impl fmt::Display for DividendBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One member's basis value going into an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisEntry {
    /// Member id.
    pub member_id: MemberId,
    /// Member name, carried through for reporting.
    pub member_name: String,
    /// Basis value. Never negative.
    pub value: Decimal,
}

/// One member's computed dividend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRecord {
    /// Member id.
    pub member_id: MemberId,
    /// Member name.
    pub member_name: String,
    /// Basis value the share was computed from.
    pub basis_value: Decimal,
    /// Fraction of the total basis (0 to 1).
    pub percent: Decimal,
    /// Rounded dividend amount.
    pub dividend: Decimal,
}

/// A persisted dividend computation for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRun {
    /// Run id.
    pub id: DividendRunId,
    /// Financial year.
    pub year: i32,
    /// Basis used.
    pub basis: DividendBasis,
    /// Profit distributed.
    pub total_profit: Decimal,
    /// Date the run was computed.
    pub computed_on: NaiveDate,
    /// Per-member results.
    pub records: Vec<DividendRecord>,
}

impl DividendRun {
    /// Sum of the rounded dividends.
    #[must_use]
    pub fn total_distributed(&self) -> Decimal {
        self.records.iter().map(|r| r.dividend).sum()
    }
}
