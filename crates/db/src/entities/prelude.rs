//! Entity re-exports.

pub use super::contributions::Entity as Contributions;
pub use super::dividend_records::Entity as DividendRecords;
pub use super::dividend_runs::Entity as DividendRuns;
pub use super::loans::Entity as Loans;
pub use super::members::Entity as Members;
pub use super::repayments::Entity as Repayments;
