//! Loan domain types.
//!
//! This module defines the loan record, its status in the lifecycle state
//! machine, and the transitions the lifecycle service hands back to the engine.

use chrono::NaiveDate;
use ikimina_shared::types::{LoanId, MemberId, RepaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::{check_rate, MAX_TERM_MONTHS};
use crate::error::{LedgerError, LedgerResult};

/// Loan status in the lifecycle state machine.
///
/// The valid transitions are:
/// - Pending → Approved (decide approve)
/// - Pending → Declined (decide decline)
/// - Approved → Active (first partial repayment)
/// - Approved | Active → Closed (balance reaches zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// Applied for, awaiting a decision.
    Pending,
    /// Approved, no repayment recorded yet.
    Approved,
    /// Declined (terminal).
    Declined,
    /// Being repaid.
    Active,
    /// Fully repaid (terminal).
    Closed,
}

impl LoanStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Declined,
        Self::Active,
        Self::Closed,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "declined" => Some(Self::Declined),
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Closed)
    }

    /// Returns true if repayments may be recorded against the loan.
    #[must_use]
    pub fn accepts_repayment(&self) -> bool {
        matches!(self, Self::Approved | Self::Active)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a loan decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanDecision {
    /// Approve the loan.
    Approve,
    /// Decline the loan.
    Decline,
}

/// A loan application as submitted by a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Applying member.
    pub member_id: MemberId,
    /// Requested principal.
    pub principal: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Monthly interest rate as a fraction (0.02 = 2%).
    pub interest_rate: Decimal,
    /// Purpose of the loan.
    pub note: Option<String>,
}

impl LoanApplication {
    /// Validates the application amounts and term.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `NegativeInterestRate`,
    /// `InterestRateOutOfRange` or `InvalidTerm`.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(self.principal));
        }
        if self.interest_rate < Decimal::ZERO {
            return Err(LedgerError::NegativeInterestRate(self.interest_rate));
        }
        check_rate(self.interest_rate)?;
        if self.term_months == 0 || self.term_months > MAX_TERM_MONTHS {
            return Err(LedgerError::InvalidTerm {
                term: self.term_months,
                max: MAX_TERM_MONTHS,
            });
        }
        Ok(())
    }
}

/// A loan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Loan id.
    pub id: LoanId,
    /// Borrowing member.
    pub member_id: MemberId,
    /// Principal lent.
    pub principal: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Monthly interest rate as a fraction.
    pub interest_rate: Decimal,
    /// Purpose of the loan.
    pub note: Option<String>,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// Date the application was made.
    pub applied_date: NaiveDate,
    /// Date the loan was approved, if it was.
    pub approved_date: Option<NaiveDate>,
    /// Member who approved or declined the loan.
    pub decided_by: Option<MemberId>,
    /// Unpaid principal. Starts at `principal`, ends at zero.
    pub outstanding_balance: Decimal,
    /// Next repayment due date while the loan is approved or active.
    pub next_due_date: Option<NaiveDate>,
}

impl Loan {
    /// Creates a pending loan from a validated application.
    #[must_use]
    pub fn pending(application: LoanApplication, applied_date: NaiveDate) -> Self {
        Self {
            id: LoanId::new(),
            member_id: application.member_id,
            principal: application.principal,
            term_months: application.term_months,
            interest_rate: application.interest_rate,
            note: application.note,
            status: LoanStatus::Pending,
            applied_date,
            approved_date: None,
            decided_by: None,
            outstanding_balance: application.principal,
            next_due_date: None,
        }
    }

    /// Total repaid so far.
    #[must_use]
    pub fn repaid(&self) -> Decimal {
        self.principal - self.outstanding_balance
    }
}

/// A repayment recorded against a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayment {
    /// Repayment id.
    pub id: RepaymentId,
    /// Loan repaid.
    pub loan_id: LoanId,
    /// Value date.
    pub date: NaiveDate,
    /// Amount received. Always positive.
    pub amount: Decimal,
    /// Member who recorded the repayment.
    pub recorded_by: MemberId,
}

impl Repayment {
    /// Creates a repayment with a fresh id.
    #[must_use]
    pub fn new(loan_id: LoanId, amount: Decimal, date: NaiveDate, recorded_by: MemberId) -> Self {
        Self {
            id: RepaymentId::new(),
            loan_id,
            date,
            amount,
            recorded_by,
        }
    }
}

/// A validated loan state transition with the fields it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanTransition {
    /// Approve a pending loan.
    Approve {
        /// Member who approved.
        approved_by: MemberId,
        /// Approval date.
        approved_date: NaiveDate,
        /// First due date.
        next_due_date: NaiveDate,
    },
    /// Decline a pending loan.
    Decline {
        /// Member who declined.
        declined_by: MemberId,
    },
    /// Apply a repayment to an approved or active loan.
    Repay {
        /// Status after the repayment.
        new_status: LoanStatus,
        /// Outstanding balance after the repayment.
        new_outstanding: Decimal,
        /// Next due date, cleared once the loan closes.
        next_due_date: Option<NaiveDate>,
    },
}

impl LoanTransition {
    /// Returns the new status resulting from this transition.
    #[must_use]
    pub fn new_status(&self) -> LoanStatus {
        match self {
            Self::Approve { .. } => LoanStatus::Approved,
            Self::Decline { .. } => LoanStatus::Declined,
            Self::Repay { new_status, .. } => *new_status,
        }
    }

    /// Writes the transition onto the loan record.
    pub fn apply(self, loan: &mut Loan) {
        match self {
            Self::Approve {
                approved_by,
                approved_date,
                next_due_date,
            } => {
                loan.status = LoanStatus::Approved;
                loan.decided_by = Some(approved_by);
                loan.approved_date = Some(approved_date);
                loan.next_due_date = Some(next_due_date);
            }
            Self::Decline { declined_by } => {
                loan.status = LoanStatus::Declined;
                loan.decided_by = Some(declined_by);
            }
            Self::Repay {
                new_status,
                new_outstanding,
                next_due_date,
            } => {
                loan.status = new_status;
                loan.outstanding_balance = new_outstanding;
                loan.next_due_date = next_due_date;
            }
        }
    }
}
