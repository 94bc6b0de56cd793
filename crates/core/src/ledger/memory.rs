//! In-memory ledger store with optimistic serializable transactions.
//!
//! Each transaction works on a snapshot taken at `begin`. Reads record the row
//! version they saw and scans record the table generation; commit succeeds only
//! if none of those changed in the meantime, otherwise it reports
//! [`StoreError::Conflict`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ikimina_shared::types::{ContributionId, DividendRunId, LoanId, MemberId, RepaymentId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::dividend::DividendRun;
use crate::ledger::store::{Isolation, LedgerStore, LedgerTransaction, StoreError, StoreResult};
use crate::loan::{Loan, Repayment};
use crate::member::{Contribution, MemberAccount};

#[derive(Debug, Clone)]
struct Versioned<V> {
    version: u64,
    value: V,
}

#[derive(Debug, Clone)]
struct Table<K, V> {
    rows: HashMap<K, Versioned<V>>,
    generation: u64,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            generation: 0,
        }
    }
}

impl<K: Eq + Hash + Copy, V: Clone> Table<K, V> {
    fn version_of(&self, key: &K) -> u64 {
        self.rows.get(key).map_or(0, |row| row.version)
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    members: Table<MemberId, MemberAccount>,
    contributions: Table<ContributionId, Contribution>,
    loans: Table<LoanId, Loan>,
    repayments: Table<RepaymentId, Repayment>,
    dividend_runs: Table<DividendRunId, DividendRun>,
}

/// Per-table transaction state: snapshot, read set and buffered writes.
#[derive(Debug)]
struct TableTx<K, V> {
    snapshot: Table<K, V>,
    reads: HashMap<K, u64>,
    writes: HashMap<K, Option<V>>,
    scanned: bool,
}

impl<K: Eq + Hash + Copy, V: Clone> TableTx<K, V> {
    fn new(snapshot: Table<K, V>) -> Self {
        Self {
            snapshot,
            reads: HashMap::new(),
            writes: HashMap::new(),
            scanned: false,
        }
    }

    fn get(&mut self, key: K) -> Option<V> {
        if let Some(write) = self.writes.get(&key) {
            return write.clone();
        }
        self.reads.insert(key, self.snapshot.version_of(&key));
        self.snapshot.rows.get(&key).map(|row| row.value.clone())
    }

    fn scan(&mut self, filter: impl Fn(&V) -> bool) -> Vec<V> {
        self.scanned = true;
        let mut merged: HashMap<K, V> = self
            .snapshot
            .rows
            .iter()
            .map(|(key, row)| (*key, row.value.clone()))
            .collect();
        for (key, write) in &self.writes {
            match write {
                Some(value) => {
                    merged.insert(*key, value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_values().filter(|value| filter(value)).collect()
    }

    fn put(&mut self, key: K, value: V) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: K) {
        self.writes.insert(key, None);
    }

    fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    fn is_valid_against(&self, live: &Table<K, V>) -> bool {
        if self.scanned && live.generation != self.snapshot.generation {
            return false;
        }
        self.reads
            .iter()
            .all(|(key, version)| live.version_of(key) == *version)
    }

    fn apply_to(self, live: &mut Table<K, V>) {
        if self.writes.is_empty() {
            return;
        }
        for (key, write) in self.writes {
            match write {
                Some(value) => {
                    let version = live.version_of(&key) + 1;
                    live.rows.insert(key, Versioned { version, value });
                }
                None => {
                    live.rows.remove(&key);
                }
            }
        }
        live.generation += 1;
    }
}

/// In-memory [`LedgerStore`].
///
/// Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failing_commits: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits of write transactions fail with a
    /// backend error.
    pub fn fail_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl LedgerStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self, isolation: Isolation) -> StoreResult<MemoryTransaction> {
        let snapshot = self.tables.lock().await.clone();
        Ok(MemoryTransaction {
            store: self.clone(),
            isolation,
            members: TableTx::new(snapshot.members),
            contributions: TableTx::new(snapshot.contributions),
            loans: TableTx::new(snapshot.loans),
            repayments: TableTx::new(snapshot.repayments),
            dividend_runs: TableTx::new(snapshot.dividend_runs),
        })
    }
}

/// Transaction on a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    isolation: Isolation,
    members: TableTx<MemberId, MemberAccount>,
    contributions: TableTx<ContributionId, Contribution>,
    loans: TableTx<LoanId, Loan>,
    repayments: TableTx<RepaymentId, Repayment>,
    dividend_runs: TableTx<DividendRunId, DividendRun>,
}

impl MemoryTransaction {
    fn ensure_writable(&self) -> StoreResult<()> {
        match self.isolation {
            Isolation::Serializable => Ok(()),
            Isolation::ConsistentRead => Err(StoreError::Backend(
                "write attempted in a read-only transaction".to_string(),
            )),
        }
    }

    fn has_writes(&self) -> bool {
        self.members.has_writes()
            || self.contributions.has_writes()
            || self.loans.has_writes()
            || self.repayments.has_writes()
            || self.dividend_runs.has_writes()
    }
}

impl LedgerTransaction for MemoryTransaction {
    async fn member(&mut self, id: MemberId) -> StoreResult<Option<MemberAccount>> {
        Ok(self.members.get(id))
    }

    async fn members(&mut self) -> StoreResult<Vec<MemberAccount>> {
        Ok(self.members.scan(|_| true))
    }

    async fn put_member(&mut self, member: MemberAccount) -> StoreResult<()> {
        self.ensure_writable()?;
        self.members.put(member.id, member);
        Ok(())
    }

    async fn contribution(&mut self, id: ContributionId) -> StoreResult<Option<Contribution>> {
        Ok(self.contributions.get(id))
    }

    async fn contributions(&mut self, member: Option<MemberId>) -> StoreResult<Vec<Contribution>> {
        Ok(self
            .contributions
            .scan(|c| member.is_none_or(|id| c.member_id == id)))
    }

    async fn put_contribution(&mut self, contribution: Contribution) -> StoreResult<()> {
        self.ensure_writable()?;
        self.contributions.put(contribution.id, contribution);
        Ok(())
    }

    async fn delete_contribution(&mut self, id: ContributionId) -> StoreResult<()> {
        self.ensure_writable()?;
        self.contributions.delete(id);
        Ok(())
    }

    async fn loan(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        Ok(self.loans.get(id))
    }

    async fn loans(&mut self, member: Option<MemberId>) -> StoreResult<Vec<Loan>> {
        Ok(self.loans.scan(|l| member.is_none_or(|id| l.member_id == id)))
    }

    async fn put_loan(&mut self, loan: Loan) -> StoreResult<()> {
        self.ensure_writable()?;
        self.loans.put(loan.id, loan);
        Ok(())
    }

    async fn repayments(&mut self, loan: LoanId) -> StoreResult<Vec<Repayment>> {
        Ok(self.repayments.scan(|r| r.loan_id == loan))
    }

    async fn put_repayment(&mut self, repayment: Repayment) -> StoreResult<()> {
        self.ensure_writable()?;
        self.repayments.put(repayment.id, repayment);
        Ok(())
    }

    async fn dividend_runs(&mut self) -> StoreResult<Vec<DividendRun>> {
        Ok(self.dividend_runs.scan(|_| true))
    }

    async fn put_dividend_run(&mut self, run: DividendRun) -> StoreResult<()> {
        self.ensure_writable()?;
        self.dividend_runs.put(run.id, run);
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        if !self.has_writes() {
            return Ok(());
        }
        if self.store.take_injected_failure() {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }

        let mut live = self.store.tables.lock().await;
        let valid = self.members.is_valid_against(&live.members)
            && self.contributions.is_valid_against(&live.contributions)
            && self.loans.is_valid_against(&live.loans)
            && self.repayments.is_valid_against(&live.repayments)
            && self.dividend_runs.is_valid_against(&live.dividend_runs);
        if !valid {
            debug!("memory store commit rejected: read set changed");
            return Err(StoreError::Conflict);
        }

        self.members.apply_to(&mut live.members);
        self.contributions.apply_to(&mut live.contributions);
        self.loans.apply_to(&mut live.loans);
        self.repayments.apply_to(&mut live.repayments);
        self.dividend_runs.apply_to(&mut live.dividend_runs);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(name: &str) -> MemberAccount {
        MemberAccount::new(name, "+250788000000", 10)
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemoryStore::new();
        let account = member("Aline");

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.put_member(account.clone()).await.unwrap();
        assert_eq!(tx.member(account.id).await.unwrap(), Some(account.clone()));
        tx.commit().await.unwrap();

        let mut read = store.begin(Isolation::ConsistentRead).await.unwrap();
        assert_eq!(read.member(account.id).await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let account = member("Eric");

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.put_member(account.clone()).await.unwrap();
        tx.rollback().await.unwrap();

        let mut read = store.begin(Isolation::ConsistentRead).await.unwrap();
        assert_eq!(read.member(account.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_write_conflict() {
        let store = MemoryStore::new();
        let account = member("Claudine");
        let mut setup = store.begin(Isolation::Serializable).await.unwrap();
        setup.put_member(account.clone()).await.unwrap();
        setup.commit().await.unwrap();

        let mut first = store.begin(Isolation::Serializable).await.unwrap();
        let mut second = store.begin(Isolation::Serializable).await.unwrap();

        let mut a = first.member(account.id).await.unwrap().unwrap();
        let mut b = second.member(account.id).await.unwrap().unwrap();
        a.deposit(dec!(100)).unwrap();
        b.deposit(dec!(200)).unwrap();
        first.put_member(a).await.unwrap();
        second.put_member(b).await.unwrap();

        first.commit().await.unwrap();
        assert_eq!(second.commit().await, Err(StoreError::Conflict));

        let mut read = store.begin(Isolation::ConsistentRead).await.unwrap();
        let stored = read.member(account.id).await.unwrap().unwrap();
        assert_eq!(stored.savings_balance, dec!(100));
    }

    #[tokio::test]
    async fn test_scan_conflicts_with_insert() {
        let store = MemoryStore::new();
        let mut reader = store.begin(Isolation::Serializable).await.unwrap();
        assert!(reader.members().await.unwrap().is_empty());
        reader.put_member(member("Scanner")).await.unwrap();

        let mut writer = store.begin(Isolation::Serializable).await.unwrap();
        writer.put_member(member("Late joiner")).await.unwrap();
        writer.commit().await.unwrap();

        assert_eq!(reader.commit().await, Err(StoreError::Conflict));
    }

    #[tokio::test]
    async fn test_disjoint_rows_do_not_conflict() {
        let store = MemoryStore::new();
        let (x, y) = (member("X"), member("Y"));
        let mut setup = store.begin(Isolation::Serializable).await.unwrap();
        setup.put_member(x.clone()).await.unwrap();
        setup.put_member(y.clone()).await.unwrap();
        setup.commit().await.unwrap();

        let mut first = store.begin(Isolation::Serializable).await.unwrap();
        let mut second = store.begin(Isolation::Serializable).await.unwrap();
        let a = first.member(x.id).await.unwrap().unwrap();
        let b = second.member(y.id).await.unwrap().unwrap();
        first.put_member(a).await.unwrap();
        second.put_member(b).await.unwrap();

        first.commit().await.unwrap();
        second.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() {
        let store = MemoryStore::new();
        let mut read = store.begin(Isolation::ConsistentRead).await.unwrap();
        let result = read.put_member(member("Nope")).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_commits(1);

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.put_member(member("Flaky")).await.unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Backend(_))));

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.put_member(member("Steady")).await.unwrap();
        assert!(tx.commit().await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_rows_disappear_from_scans() {
        let store = MemoryStore::new();
        let account = member("Journal");
        let contribution = Contribution::new(
            account.id,
            dec!(500),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            None,
        );

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.put_contribution(contribution.clone()).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(Isolation::Serializable).await.unwrap();
        tx.delete_contribution(contribution.id).await.unwrap();
        assert!(tx.contributions(Some(account.id)).await.unwrap().is_empty());
        tx.commit().await.unwrap();

        let mut read = store.begin(Isolation::ConsistentRead).await.unwrap();
        assert_eq!(read.contribution(contribution.id).await.unwrap(), None);
    }
}
