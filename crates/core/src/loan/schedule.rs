//! Equal-installment amortization schedule.
//!
//! The schedule is informational: it tells a borrower what a regular
//! installment looks like. The loan's outstanding balance is driven only by
//! recorded repayments.

use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::amount::MAX_TERM_MONTHS;
use crate::error::{LedgerError, LedgerResult};
use crate::loan::types::Loan;

/// One period of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleLine {
    /// Period number, starting at 1.
    pub period: u32,
    /// Due date of the installment.
    pub due_date: NaiveDate,
    /// Total installment (interest plus principal).
    pub installment: Decimal,
    /// Interest portion.
    pub interest: Decimal,
    /// Principal portion.
    pub principal: Decimal,
    /// Principal still owed after this installment.
    pub remaining: Decimal,
}

impl Loan {
    /// Builds the equal-installment schedule for this loan.
    ///
    /// Due dates start one cadence after approval (or application, for a loan
    /// not yet approved). Amounts are rounded half away from zero to
    /// `decimal_places`; the final line absorbs the rounding remainder.
    ///
    /// # Errors
    ///
    /// See [`amortize`].
    pub fn repayment_schedule(
        &self,
        cadence: Duration,
        decimal_places: u32,
    ) -> LedgerResult<Vec<ScheduleLine>> {
        let start = self.approved_date.unwrap_or(self.applied_date);
        amortize(
            self.principal,
            self.interest_rate,
            self.term_months,
            start,
            cadence,
            decimal_places,
        )
    }
}

const OVERFLOW: LedgerError = LedgerError::Overflow("repayment schedule");

fn round(value: Decimal, decimal_places: u32) -> Decimal {
    value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}

/// Level installment for `principal` over `periods` at `rate` per period:
/// `principal × rate / (1 − (1 + rate)^−periods)`.
///
/// The discount factor shrinks towards zero as `periods` grows, so long terms
/// stay in range.
fn level_installment(principal: Decimal, rate: Decimal, periods: u32) -> Option<Decimal> {
    if rate.is_zero() {
        return principal.checked_div(Decimal::from(periods));
    }

    let discount = Decimal::ONE.checked_div(Decimal::ONE.checked_add(rate)?)?;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor.checked_mul(discount)?;
    }

    principal
        .checked_mul(rate)?
        .checked_div(Decimal::ONE.checked_sub(factor)?)
}

/// Computes an amortization schedule.
///
/// # Errors
///
/// - `InvalidTerm` if `periods` exceeds the longest accepted term
/// - `DateOutOfRange` if a due date would fall past the calendar's end
/// - `Overflow` if an installment leaves the decimal range
pub fn amortize(
    principal: Decimal,
    rate: Decimal,
    periods: u32,
    start: NaiveDate,
    cadence: Duration,
    decimal_places: u32,
) -> LedgerResult<Vec<ScheduleLine>> {
    if periods == 0 || principal <= Decimal::ZERO {
        return Ok(Vec::new());
    }
    if periods > MAX_TERM_MONTHS {
        return Err(LedgerError::InvalidTerm {
            term: periods,
            max: MAX_TERM_MONTHS,
        });
    }

    let installment = round(
        level_installment(principal, rate, periods).ok_or(OVERFLOW)?,
        decimal_places,
    );
    let mut remaining = principal;
    let mut due_date = start;
    let mut lines = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        due_date = due_date
            .checked_add_signed(cadence)
            .ok_or(LedgerError::DateOutOfRange(due_date))?;
        let interest = round(remaining.checked_mul(rate).ok_or(OVERFLOW)?, decimal_places);
        let principal_part = if period == periods {
            remaining
        } else {
            installment
                .checked_sub(interest)
                .ok_or(OVERFLOW)?
                .clamp(Decimal::ZERO, remaining)
        };
        remaining -= principal_part;

        lines.push(ScheduleLine {
            period,
            due_date,
            installment: interest.checked_add(principal_part).ok_or(OVERFLOW)?,
            interest,
            principal: principal_part,
            remaining,
        });
    }

    Ok(lines)
}
