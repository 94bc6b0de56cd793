//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
pub enum LoanStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Dividend allocation basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "dividend_basis")]
pub enum DividendBasis {
    #[sea_orm(string_value = "shares")]
    Shares,
    #[sea_orm(string_value = "contributions")]
    Contributions,
}

impl From<ikimina_core::loan::LoanStatus> for LoanStatus {
    fn from(status: ikimina_core::loan::LoanStatus) -> Self {
        use ikimina_core::loan::LoanStatus as Core;
        match status {
            Core::Pending => Self::Pending,
            Core::Approved => Self::Approved,
            Core::Declined => Self::Declined,
            Core::Active => Self::Active,
            Core::Closed => Self::Closed,
        }
    }
}

impl From<LoanStatus> for ikimina_core::loan::LoanStatus {
    fn from(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Pending => Self::Pending,
            LoanStatus::Approved => Self::Approved,
            LoanStatus::Declined => Self::Declined,
            LoanStatus::Active => Self::Active,
            LoanStatus::Closed => Self::Closed,
        }
    }
}

impl From<ikimina_core::dividend::DividendBasis> for DividendBasis {
    fn from(basis: ikimina_core::dividend::DividendBasis) -> Self {
        match basis {
            ikimina_core::dividend::DividendBasis::Shares => Self::Shares,
            ikimina_core::dividend::DividendBasis::Contributions => Self::Contributions,
        }
    }
}

impl From<DividendBasis> for ikimina_core::dividend::DividendBasis {
    fn from(basis: DividendBasis) -> Self {
        match basis {
            DividendBasis::Shares => Self::Shares,
            DividendBasis::Contributions => Self::Contributions,
        }
    }
}
