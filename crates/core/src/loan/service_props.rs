//! Property-based tests for the loan lifecycle.

use chrono::{Duration, NaiveDate};
use ikimina_shared::OverpaymentPolicy;
use ikimina_shared::types::MemberId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::error::LedgerError;
use crate::loan::service::LoanLifecycle;
use crate::loan::types::{Loan, LoanApplication, LoanDecision, LoanStatus};

fn arb_status() -> impl Strategy<Value = LoanStatus> {
    prop_oneof![
        Just(LoanStatus::Pending),
        Just(LoanStatus::Approved),
        Just(LoanStatus::Declined),
        Just(LoanStatus::Active),
        Just(LoanStatus::Closed),
    ]
}

fn arb_decision() -> impl Strategy<Value = LoanDecision> {
    prop_oneof![Just(LoanDecision::Approve), Just(LoanDecision::Decline)]
}

/// Whole-franc amounts from 1 to 1,000,000.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(Decimal::from)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn approved_loan(principal: Decimal) -> Loan {
    let mut loan = Loan::pending(
        LoanApplication {
            member_id: MemberId::new(),
            principal,
            term_months: 12,
            interest_rate: Decimal::ZERO,
            note: None,
        },
        today(),
    );
    loan.status = LoanStatus::Approved;
    loan
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Deciding anything but a pending loan fails and the transition table agrees.
    #[test]
    fn prop_decide_only_from_pending(status in arb_status(), decision in arb_decision()) {
        let mut loan = approved_loan(Decimal::from(1000));
        loan.status = status;
        let result = LoanLifecycle::decide(&loan, decision, MemberId::new(), today(), Duration::days(30));

        if status == LoanStatus::Pending {
            let transition = result.unwrap();
            prop_assert!(LoanLifecycle::is_valid_transition(status, transition.new_status()));
        } else {
            let is_invalid_transition = matches!(result, Err(LedgerError::InvalidTransition { .. }));
            prop_assert!(is_invalid_transition);
        }
    }

    /// Outstanding never increases, never goes negative, and equals
    /// principal minus accepted repayments.
    #[test]
    fn prop_outstanding_tracks_repayments(
        principal in arb_amount(),
        payments in prop::collection::vec(arb_amount(), 1..20),
    ) {
        let mut loan = approved_loan(principal);
        let mut accepted = Decimal::ZERO;

        for amount in payments {
            let before = loan.outstanding_balance;
            match LoanLifecycle::repay(&loan, amount, today(), Duration::days(30), OverpaymentPolicy::Reject) {
                Ok(transition) => {
                    prop_assert!(LoanLifecycle::is_valid_transition(loan.status, transition.new_status()));
                    transition.apply(&mut loan);
                    accepted += amount;
                    prop_assert!(loan.outstanding_balance <= before);
                }
                Err(LedgerError::Overpayment { .. } | LedgerError::InvalidTransition { .. }) => {
                    prop_assert_eq!(loan.outstanding_balance, before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }

            prop_assert!(loan.outstanding_balance >= Decimal::ZERO);
            prop_assert_eq!(loan.outstanding_balance, principal - accepted);
            prop_assert_eq!(loan.status == LoanStatus::Closed, loan.outstanding_balance.is_zero());
            prop_assert_eq!(loan.status == LoanStatus::Closed, loan.next_due_date.is_none());
        }
    }

    /// Under the clamp policy the balance is principal minus repayments, floored at zero.
    #[test]
    fn prop_clamp_floors_at_zero(
        principal in arb_amount(),
        payments in prop::collection::vec(arb_amount(), 1..20),
    ) {
        let mut loan = approved_loan(principal);
        let mut paid = Decimal::ZERO;

        for amount in payments {
            if loan.status == LoanStatus::Closed {
                break;
            }
            LoanLifecycle::repay(&loan, amount, today(), Duration::days(30), OverpaymentPolicy::Clamp)
                .unwrap()
                .apply(&mut loan);
            paid += amount;
            prop_assert_eq!(loan.outstanding_balance, (principal - paid).max(Decimal::ZERO));
        }
    }
}
