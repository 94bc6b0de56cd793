//! Ledger-wide aggregates.

use ikimina_shared::types::{Currency, Money};
use serde::{Deserialize, Serialize};

use crate::amount::checked_sum;
use crate::error::LedgerResult;
use crate::loan::{Loan, LoanStatus};
use crate::member::MemberAccount;

/// Number of loans in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanStatusCounts {
    /// Awaiting a decision.
    pub pending: u64,
    /// Approved, not yet repaid from.
    pub approved: u64,
    /// Being repaid.
    pub active: u64,
    /// Declined.
    pub declined: u64,
    /// Fully repaid.
    pub closed: u64,
}

impl LoanStatusCounts {
    fn record(&mut self, status: LoanStatus) {
        match status {
            LoanStatus::Pending => self.pending += 1,
            LoanStatus::Approved => self.approved += 1,
            LoanStatus::Active => self.active += 1,
            LoanStatus::Declined => self.declined += 1,
            LoanStatus::Closed => self.closed += 1,
        }
    }

    /// Total number of loans.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.active + self.declined + self.closed
    }
}

/// Cooperative-wide summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Sum of all members' savings balances.
    pub total_savings: Money,
    /// Principal of loans that are approved or active.
    pub total_principal: Money,
    /// Outstanding balance of loans that are approved or active.
    pub total_outstanding: Money,
    /// Registered members.
    pub member_count: u64,
    /// Loans by status.
    pub loans: LoanStatusCounts,
}

impl LedgerSummary {
    /// Aggregates members and loans.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if a total leaves the decimal range.
    pub fn from_rows(
        members: &[MemberAccount],
        loans: &[Loan],
        currency: Currency,
    ) -> LedgerResult<Self> {
        let total_savings = checked_sum(members.iter().map(|m| m.savings_balance), "total savings")?;

        let mut counts = LoanStatusCounts::default();
        for loan in loans {
            counts.record(loan.status);
        }
        let live = || loans.iter().filter(|loan| loan.status.accepts_repayment());
        let principal = checked_sum(live().map(|loan| loan.principal), "total principal")?;
        let outstanding =
            checked_sum(live().map(|loan| loan.outstanding_balance), "total outstanding")?;

        Ok(Self {
            total_savings: Money::new(total_savings, currency),
            total_principal: Money::new(principal, currency),
            total_outstanding: Money::new(outstanding, currency),
            member_count: members.len() as u64,
            loans: counts,
        })
    }
}
