//! Loan lifecycle.
//!
//! Loans move `pending → approved → active → closed`, or `pending → declined`.
//! [`LoanLifecycle`] validates each step; the ledger engine persists it.

pub mod schedule;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use schedule::ScheduleLine;
pub use service::LoanLifecycle;
pub use types::{Loan, LoanApplication, LoanDecision, LoanStatus, LoanTransition, Repayment};
