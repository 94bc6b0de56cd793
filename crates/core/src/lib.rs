//! Core business logic for Ikimina.
//!
//! This crate contains the cooperative's domain rules with ZERO web or
//! database dependencies. Persistence is reached only through the
//! [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `amount` - Storable ranges for money and rates
//! - `member` - Member accounts and the savings journal
//! - `loan` - Loan lifecycle state machine and amortization schedule
//! - `dividend` - Proportional profit allocation
//! - `ledger` - Transactional engine, store seam, notifications
//! - `error` - Error types shared by every operation

pub mod amount;
pub mod dividend;
pub mod error;
pub mod ledger;
pub mod loan;
pub mod member;

pub use error::{ErrorKind, LedgerError, LedgerResult};
