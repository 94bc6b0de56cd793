//! PostgreSQL ledger store.
//!
//! Mutating engine operations run in `SERIALIZABLE` read-write transactions;
//! rows read by id inside them are locked `FOR UPDATE`. Reports and queries run
//! in `REPEATABLE READ` read-only transactions. PostgreSQL serialization
//! failures and deadlocks surface as [`StoreError::Conflict`].

use std::collections::HashMap;

use chrono::Utc;
use ikimina_core::dividend::{DividendRecord, DividendRun};
use ikimina_core::ledger::{Isolation, LedgerStore, LedgerTransaction, StoreError, StoreResult};
use ikimina_core::loan::{Loan, Repayment};
use ikimina_core::member::{Contribution, MemberAccount};
use ikimina_shared::types::{
    ContributionId, DividendRunId, LoanId, MemberId, RepaymentId,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IsolationLevel, QueryFilter, QueryOrder, QuerySelect, RuntimeErr, Select,
    TransactionTrait,
};
use tracing::debug;

use crate::entities::{
    contributions, dividend_records, dividend_runs, loans, members, repayments,
};

/// SQLSTATE codes PostgreSQL uses for retryable transaction aborts.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// [`LedgerStore`] backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Creates a store on an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LedgerStore for SeaOrmStore {
    type Tx = SeaOrmTransaction;

    async fn begin(&self, isolation: Isolation) -> StoreResult<SeaOrmTransaction> {
        let (level, mode) = match isolation {
            Isolation::Serializable => (IsolationLevel::Serializable, AccessMode::ReadWrite),
            Isolation::ConsistentRead => (IsolationLevel::RepeatableRead, AccessMode::ReadOnly),
        };
        let txn = self
            .db
            .begin_with_config(Some(level), Some(mode))
            .await
            .map_err(map_db_err)?;
        Ok(SeaOrmTransaction { txn, isolation })
    }
}

/// Transaction on a [`SeaOrmStore`].
pub struct SeaOrmTransaction {
    txn: DatabaseTransaction,
    isolation: Isolation,
}

impl SeaOrmTransaction {
    /// Locks rows read by id when the transaction will write.
    fn for_update<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        match self.isolation {
            Isolation::Serializable => select.lock_exclusive(),
            Isolation::ConsistentRead => select,
        }
    }
}

impl LedgerTransaction for SeaOrmTransaction {
    async fn member(&mut self, id: MemberId) -> StoreResult<Option<MemberAccount>> {
        let model = self
            .for_update(members::Entity::find_by_id(id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        model.map(member_from_model).transpose()
    }

    async fn members(&mut self) -> StoreResult<Vec<MemberAccount>> {
        members::Entity::find()
            .order_by_asc(members::Column::Name)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(member_from_model)
            .collect()
    }

    async fn put_member(&mut self, member: MemberAccount) -> StoreResult<()> {
        let now = Utc::now().into();
        let model = members::ActiveModel {
            id: Set(member.id.into_inner()),
            name: Set(member.name),
            phone: Set(member.phone),
            shares: Set(to_i32(member.shares, "shares")?),
            savings_balance: Set(member.savings_balance),
            created_at: Set(now),
            updated_at: Set(now),
        };
        members::Entity::insert(model)
            .on_conflict(
                OnConflict::column(members::Column::Id)
                    .update_columns([
                        members::Column::Name,
                        members::Column::Phone,
                        members::Column::Shares,
                        members::Column::SavingsBalance,
                        members::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn contribution(&mut self, id: ContributionId) -> StoreResult<Option<Contribution>> {
        let model = self
            .for_update(contributions::Entity::find_by_id(id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(model.map(contribution_from_model))
    }

    async fn contributions(&mut self, member: Option<MemberId>) -> StoreResult<Vec<Contribution>> {
        let mut query = contributions::Entity::find();
        if let Some(member_id) = member {
            query = query.filter(contributions::Column::MemberId.eq(member_id.into_inner()));
        }
        Ok(query
            .order_by_desc(contributions::Column::ContributionDate)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(contribution_from_model)
            .collect())
    }

    async fn put_contribution(&mut self, contribution: Contribution) -> StoreResult<()> {
        let model = contributions::ActiveModel {
            id: Set(contribution.id.into_inner()),
            member_id: Set(contribution.member_id.into_inner()),
            contribution_date: Set(contribution.date),
            amount: Set(contribution.amount),
            note: Set(contribution.note),
            created_at: Set(Utc::now().into()),
        };
        contributions::Entity::insert(model)
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn delete_contribution(&mut self, id: ContributionId) -> StoreResult<()> {
        contributions::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn loan(&mut self, id: LoanId) -> StoreResult<Option<Loan>> {
        let model = self
            .for_update(loans::Entity::find_by_id(id.into_inner()))
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;
        model.map(loan_from_model).transpose()
    }

    async fn loans(&mut self, member: Option<MemberId>) -> StoreResult<Vec<Loan>> {
        let mut query = loans::Entity::find();
        if let Some(member_id) = member {
            query = query.filter(loans::Column::MemberId.eq(member_id.into_inner()));
        }
        query
            .order_by_desc(loans::Column::AppliedDate)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(loan_from_model)
            .collect()
    }

    async fn put_loan(&mut self, loan: Loan) -> StoreResult<()> {
        let now = Utc::now().into();
        let model = loans::ActiveModel {
            id: Set(loan.id.into_inner()),
            member_id: Set(loan.member_id.into_inner()),
            principal: Set(loan.principal),
            term_months: Set(to_i32(loan.term_months, "term_months")?),
            interest_rate: Set(loan.interest_rate),
            note: Set(loan.note),
            status: Set(loan.status.into()),
            applied_date: Set(loan.applied_date),
            approved_date: Set(loan.approved_date),
            decided_by: Set(loan.decided_by.map(MemberId::into_inner)),
            outstanding_balance: Set(loan.outstanding_balance),
            next_due_date: Set(loan.next_due_date),
            created_at: Set(now),
            updated_at: Set(now),
        };
        loans::Entity::insert(model)
            .on_conflict(
                OnConflict::column(loans::Column::Id)
                    .update_columns([
                        loans::Column::Status,
                        loans::Column::ApprovedDate,
                        loans::Column::DecidedBy,
                        loans::Column::OutstandingBalance,
                        loans::Column::NextDueDate,
                        loans::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn repayments(&mut self, loan: LoanId) -> StoreResult<Vec<Repayment>> {
        Ok(repayments::Entity::find()
            .filter(repayments::Column::LoanId.eq(loan.into_inner()))
            .order_by_desc(repayments::Column::RepaymentDate)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(repayment_from_model)
            .collect())
    }

    async fn put_repayment(&mut self, repayment: Repayment) -> StoreResult<()> {
        let model = repayments::ActiveModel {
            id: Set(repayment.id.into_inner()),
            loan_id: Set(repayment.loan_id.into_inner()),
            repayment_date: Set(repayment.date),
            amount: Set(repayment.amount),
            recorded_by: Set(repayment.recorded_by.into_inner()),
            created_at: Set(Utc::now().into()),
        };
        repayments::Entity::insert(model)
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn dividend_runs(&mut self) -> StoreResult<Vec<DividendRun>> {
        let runs = dividend_runs::Entity::find()
            .order_by_desc(dividend_runs::Column::Year)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?;
        if runs.is_empty() {
            return Ok(Vec::new());
        }

        let run_ids: Vec<_> = runs.iter().map(|run| run.id).collect();
        let mut records: HashMap<_, Vec<DividendRecord>> = HashMap::new();
        for record in dividend_records::Entity::find()
            .filter(dividend_records::Column::RunId.is_in(run_ids))
            .order_by_asc(dividend_records::Column::Position)
            .all(&self.txn)
            .await
            .map_err(map_db_err)?
        {
            records
                .entry(record.run_id)
                .or_default()
                .push(record_from_model(record));
        }

        Ok(runs
            .into_iter()
            .map(|run| DividendRun {
                id: DividendRunId::from_uuid(run.id),
                year: run.year,
                basis: run.basis.into(),
                total_profit: run.total_profit.normalize(),
                computed_on: run.computed_on,
                records: records.remove(&run.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn put_dividend_run(&mut self, run: DividendRun) -> StoreResult<()> {
        let run_id = run.id.into_inner();
        dividend_runs::Entity::insert(dividend_runs::ActiveModel {
            id: Set(run_id),
            year: Set(run.year),
            basis: Set(run.basis.into()),
            total_profit: Set(run.total_profit),
            computed_on: Set(run.computed_on),
            created_at: Set(Utc::now().into()),
        })
        .exec(&self.txn)
        .await
        .map_err(map_db_err)?;

        if run.records.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(run.records.len());
        for (position, record) in run.records.into_iter().enumerate() {
            rows.push(dividend_records::ActiveModel {
                run_id: Set(run_id),
                position: Set(to_i32(position, "position")?),
                member_id: Set(record.member_id.into_inner()),
                member_name: Set(record.member_name),
                basis_value: Set(record.basis_value),
                percent: Set(record.percent),
                dividend: Set(record.dividend),
            });
        }
        dividend_records::Entity::insert_many(rows)
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.txn.commit().await.map_err(map_db_err)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.txn.rollback().await.map_err(map_db_err)
    }
}

// ============================================================
// ERROR MAPPING
// ============================================================

/// Maps a database error to a store error, singling out retryable aborts.
fn map_db_err(err: DbErr) -> StoreError {
    if is_retryable_abort(&err) {
        debug!(error = %err, "serialization failure");
        StoreError::Conflict
    } else {
        StoreError::Backend(err.to_string())
    }
}

fn is_retryable_abort(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx_err))) = err
    else {
        return false;
    };
    match sqlx_err {
        sqlx::Error::Database(db_err) => matches!(
            db_err.code().as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

// ============================================================
// ROW CONVERSIONS
// ============================================================

fn to_i32<T: TryInto<i32>>(value: T, field: &str) -> StoreResult<i32> {
    value
        .try_into()
        .map_err(|_| StoreError::Backend(format!("{field} out of range")))
}

fn to_u32(value: i32, field: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Backend(format!("negative {field} in storage")))
}

fn member_from_model(model: members::Model) -> StoreResult<MemberAccount> {
    Ok(MemberAccount {
        id: MemberId::from_uuid(model.id),
        name: model.name,
        phone: model.phone,
        shares: to_u32(model.shares, "shares")?,
        savings_balance: model.savings_balance.normalize(),
    })
}

fn contribution_from_model(model: contributions::Model) -> Contribution {
    Contribution {
        id: ContributionId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        date: model.contribution_date,
        amount: model.amount.normalize(),
        note: model.note,
    }
}

fn loan_from_model(model: loans::Model) -> StoreResult<Loan> {
    Ok(Loan {
        id: LoanId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        principal: model.principal.normalize(),
        term_months: to_u32(model.term_months, "term_months")?,
        interest_rate: model.interest_rate.normalize(),
        note: model.note,
        status: model.status.into(),
        applied_date: model.applied_date,
        approved_date: model.approved_date,
        decided_by: model.decided_by.map(MemberId::from_uuid),
        outstanding_balance: model.outstanding_balance.normalize(),
        next_due_date: model.next_due_date,
    })
}

fn repayment_from_model(model: repayments::Model) -> Repayment {
    Repayment {
        id: RepaymentId::from_uuid(model.id),
        loan_id: LoanId::from_uuid(model.loan_id),
        date: model.repayment_date,
        amount: model.amount.normalize(),
        recorded_by: MemberId::from_uuid(model.recorded_by),
    }
}

fn record_from_model(model: dividend_records::Model) -> DividendRecord {
    DividendRecord {
        member_id: MemberId::from_uuid(model.member_id),
        member_name: model.member_name,
        basis_value: model.basis_value.normalize(),
        percent: model.percent.normalize(),
        dividend: model.dividend.normalize(),
    }
}
