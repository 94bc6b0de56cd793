//! Loan lifecycle state machine.
//!
//! The lifecycle service validates a requested transition against the loan's
//! current state and returns the [`LoanTransition`] to apply. It never touches
//! storage; the ledger engine applies the transition inside its transaction.

use chrono::{Duration, NaiveDate};
use ikimina_shared::OverpaymentPolicy;
use ikimina_shared::types::MemberId;
use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::loan::types::{Loan, LoanDecision, LoanStatus, LoanTransition};

/// Stateless service for loan state transitions.
pub struct LoanLifecycle;

impl LoanLifecycle {
    /// Decide a pending loan.
    ///
    /// On approval the first due date is `today + cadence`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the loan is pending, or
    /// `DateOutOfRange` if the first due date cannot be represented.
    pub fn decide(
        loan: &Loan,
        decision: LoanDecision,
        decided_by: MemberId,
        today: NaiveDate,
        cadence: Duration,
    ) -> LedgerResult<LoanTransition> {
        if loan.status != LoanStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                from: loan.status,
                action: "decide",
            });
        }

        Ok(match decision {
            LoanDecision::Approve => LoanTransition::Approve {
                approved_by: decided_by,
                approved_date: today,
                next_due_date: today
                    .checked_add_signed(cadence)
                    .ok_or(LedgerError::DateOutOfRange(today))?,
            },
            LoanDecision::Decline => LoanTransition::Decline {
                declined_by: decided_by,
            },
        })
    }

    /// Apply a repayment to an approved or active loan.
    ///
    /// The loan becomes active on the first partial repayment and closed once
    /// the outstanding balance reaches zero, at which point the due date is
    /// cleared. Otherwise the next due date moves to `date + cadence`.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `InvalidTransition` if the loan is pending, declined or closed
    /// - `Overpayment` if `amount` exceeds the balance under [`OverpaymentPolicy::Reject`]
    /// - `DateOutOfRange` if the next due date cannot be represented
    pub fn repay(
        loan: &Loan,
        amount: Decimal,
        date: NaiveDate,
        cadence: Duration,
        policy: OverpaymentPolicy,
    ) -> LedgerResult<LoanTransition> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if !loan.status.accepts_repayment() {
            return Err(LedgerError::InvalidTransition {
                from: loan.status,
                action: "repay",
            });
        }
        if amount > loan.outstanding_balance && policy == OverpaymentPolicy::Reject {
            return Err(LedgerError::Overpayment {
                amount,
                outstanding: loan.outstanding_balance,
            });
        }

        let new_outstanding = (loan.outstanding_balance - amount).max(Decimal::ZERO);
        let transition = if new_outstanding.is_zero() {
            LoanTransition::Repay {
                new_status: LoanStatus::Closed,
                new_outstanding,
                next_due_date: None,
            }
        } else {
            LoanTransition::Repay {
                new_status: LoanStatus::Active,
                new_outstanding,
                next_due_date: Some(
                    date.checked_add_signed(cadence)
                        .ok_or(LedgerError::DateOutOfRange(date))?,
                ),
            }
        };
        Ok(transition)
    }

    /// Check if a transition between two statuses is allowed.
    #[must_use]
    pub fn is_valid_transition(from: LoanStatus, to: LoanStatus) -> bool {
        matches!(
            (from, to),
            (
                LoanStatus::Pending,
                LoanStatus::Approved | LoanStatus::Declined
            ) | (
                LoanStatus::Approved | LoanStatus::Active,
                LoanStatus::Active | LoanStatus::Closed
            )
        )
    }
}
