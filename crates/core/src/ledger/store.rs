//! Ledger store interface.
//!
//! The engine talks to persistence only through these traits. Implemented by
//! [`MemoryStore`](crate::ledger::memory::MemoryStore) here and by the
//! PostgreSQL store in the db crate.

use std::future::Future;

use ikimina_shared::types::{ContributionId, LoanId, MemberId};
use thiserror::Error;

use crate::dividend::DividendRun;
use crate::error::LedgerError;
use crate::loan::{Loan, Repayment};
use crate::member::{Contribution, MemberAccount};

/// Isolation level requested when opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    /// Read-write, serializable. Used by every mutating operation.
    Serializable,
    /// Read-only snapshot. Used by reports and queries.
    ConsistentRead,
}

/// Errors reported by a ledger store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A concurrent transaction invalidated this one.
    #[error("serialization conflict")]
    Conflict,
    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::Backend(message) => Self::Storage(message),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A transactional ledger store.
pub trait LedgerStore: Send + Sync {
    /// Transaction handle.
    type Tx: LedgerTransaction;

    /// Opens a transaction.
    fn begin(&self, isolation: Isolation) -> impl Future<Output = StoreResult<Self::Tx>> + Send;
}

/// One unit of work against the ledger store.
///
/// Reads inside a serializable transaction participate in conflict detection.
/// Dropping a transaction without committing discards its writes.
pub trait LedgerTransaction: Send + Sized {
    /// Find a member by id.
    fn member(
        &mut self,
        id: MemberId,
    ) -> impl Future<Output = StoreResult<Option<MemberAccount>>> + Send;

    /// All members.
    fn members(&mut self) -> impl Future<Output = StoreResult<Vec<MemberAccount>>> + Send;

    /// Insert or update a member.
    fn put_member(&mut self, member: MemberAccount) -> impl Future<Output = StoreResult<()>> + Send;

    /// Find a contribution by id.
    fn contribution(
        &mut self,
        id: ContributionId,
    ) -> impl Future<Output = StoreResult<Option<Contribution>>> + Send;

    /// Contributions, optionally for one member.
    fn contributions(
        &mut self,
        member: Option<MemberId>,
    ) -> impl Future<Output = StoreResult<Vec<Contribution>>> + Send;

    /// Insert a contribution.
    fn put_contribution(
        &mut self,
        contribution: Contribution,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete a contribution.
    fn delete_contribution(
        &mut self,
        id: ContributionId,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Find a loan by id.
    fn loan(&mut self, id: LoanId) -> impl Future<Output = StoreResult<Option<Loan>>> + Send;

    /// Loans, optionally for one member.
    fn loans(
        &mut self,
        member: Option<MemberId>,
    ) -> impl Future<Output = StoreResult<Vec<Loan>>> + Send;

    /// Insert or update a loan.
    fn put_loan(&mut self, loan: Loan) -> impl Future<Output = StoreResult<()>> + Send;

    /// Repayments recorded against a loan.
    fn repayments(
        &mut self,
        loan: LoanId,
    ) -> impl Future<Output = StoreResult<Vec<Repayment>>> + Send;

    /// Insert a repayment.
    fn put_repayment(&mut self, repayment: Repayment)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// All dividend runs.
    fn dividend_runs(&mut self) -> impl Future<Output = StoreResult<Vec<DividendRun>>> + Send;

    /// Insert a dividend run with its records.
    fn put_dividend_run(&mut self, run: DividendRun)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Make the transaction's writes durable.
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Discard the transaction's writes.
    fn rollback(self) -> impl Future<Output = StoreResult<()>> + Send;
}
