//! The ledger engine.
//!
//! Every mutating operation runs in one serializable store transaction: inputs
//! are validated first, rows are re-read inside the transaction, and the
//! transaction either commits as a whole or is rolled back. Reports and queries
//! run in consistent-read transactions. Member notifications are sent only
//! after a successful commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use ikimina_shared::types::{
    ContributionId, DividendRunId, LoanId, MemberId, Money, PageRequest, PageResponse,
};
use ikimina_shared::{LedgerConfig, NotificationConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::amount::{add_within_limit, check_amount};
use crate::dividend::{BasisEntry, DividendAllocator, DividendBasis, DividendRecord, DividendRun};
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::actor::{Actor, capability};
use crate::ledger::notify::{LogNotifier, MessageTemplates, Notification, Notifier, Outbox};
use crate::ledger::store::{Isolation, LedgerStore, LedgerTransaction, StoreError};
use crate::ledger::summary::LedgerSummary;
use crate::loan::{
    Loan, LoanApplication, LoanDecision, LoanLifecycle, LoanStatus, Repayment, ScheduleLine,
};
use crate::member::{Contribution, MemberAccount, NewMember};

/// A recorded repayment and the loan as it stands afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    /// Loan after the repayment.
    pub loan: Loan,
    /// The repayment journal entry.
    pub repayment: Repayment,
}

/// The cooperative ledger engine.
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
    notifications: NotificationConfig,
    templates: MessageTemplates,
    notifier: Arc<dyn Notifier>,
    outbox: Outbox,
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an engine that logs notifications instead of sending them.
    #[must_use]
    pub fn new(store: S, config: LedgerConfig) -> Self {
        let notifications = NotificationConfig::default();
        Self {
            store,
            config,
            templates: MessageTemplates::new(notifications.sender_id.clone()),
            notifier: Arc::new(LogNotifier),
            outbox: Outbox::with_capacity(notifications.outbox_capacity),
            notifications,
        }
    }

    /// Replaces the notification channel and its settings. Anything already
    /// queued for retry is discarded.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, config: NotificationConfig) -> Self {
        self.templates = MessageTemplates::new(config.sender_id.clone());
        self.outbox = Outbox::with_capacity(config.outbox_capacity);
        self.notifications = config;
        self.notifier = notifier;
        self
    }

    /// The ledger configuration in effect.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.config.currency)
    }

    /// Rejects amounts finer than the currency's minor unit or too large to store.
    fn check_amount(&self, amount: Decimal) -> LedgerResult<()> {
        check_amount(amount, self.config.currency.minor_units())
    }

    // ========== Members ==========

    /// Registers a member, booking any opening savings as a first contribution.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a blank name or phone, `InvalidAmount` for negative
    /// or unstorable opening savings, `Conflict`/`Inconsistent` from the store.
    pub async fn register_member(&self, new_member: NewMember) -> LedgerResult<MemberAccount> {
        new_member.validate()?;
        self.check_amount(new_member.opening_savings)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = register_member_in(&mut tx, new_member).await;
        let account = finish(tx, result).await?;

        info!(
            member_id = %account.id,
            shares = account.shares,
            savings = %account.savings_balance,
            "member registered"
        );
        Ok(account)
    }

    /// Sets a member's share count.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the actor is an admin, `NotFound` for an unknown member.
    pub async fn update_shares(
        &self,
        member_id: MemberId,
        shares: u32,
        actor: &Actor,
    ) -> LedgerResult<MemberAccount> {
        actor.require(capability::ADMIN)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = update_shares_in(&mut tx, member_id, shares).await;
        let account = finish(tx, result).await?;

        info!(member_id = %member_id, shares, actor = %actor.member_id, "shares updated");
        Ok(account)
    }

    /// Credits a contribution to a member's savings.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, finer than the currency's minor unit,
    /// or would take savings out of the storable range. `NotFound` for an
    /// unknown member.
    pub async fn record_contribution(
        &self,
        member_id: MemberId,
        amount: Decimal,
        date: NaiveDate,
        note: Option<String>,
    ) -> LedgerResult<Contribution> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        self.check_amount(amount)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = record_contribution_in(&mut tx, member_id, amount, date, note).await;
        let contribution = finish(tx, result).await?;

        info!(
            contribution_id = %contribution.id,
            member_id = %member_id,
            amount = %amount,
            "contribution recorded"
        );
        Ok(contribution)
    }

    /// Deletes a contribution and takes its amount back out of savings.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown contribution, `Inconsistent` if the savings
    /// balance would go negative.
    pub async fn reverse_contribution(&self, id: ContributionId) -> LedgerResult<Contribution> {
        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = reverse_contribution_in(&mut tx, id).await;
        let contribution = finish(tx, result).await?;

        info!(
            contribution_id = %id,
            member_id = %contribution.member_id,
            amount = %contribution.amount,
            "contribution reversed"
        );
        Ok(contribution)
    }

    // ========== Loans ==========

    /// Files a loan application. The loan starts pending.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `InvalidTerm`, or `NotFound` for an unknown member.
    pub async fn apply_loan(&self, application: LoanApplication) -> LedgerResult<Loan> {
        application.validate()?;
        self.check_amount(application.principal)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = apply_loan_in(&mut tx, application, today()).await;
        let loan = finish(tx, result).await?;

        info!(
            loan_id = %loan.id,
            member_id = %loan.member_id,
            principal = %loan.principal,
            term_months = loan.term_months,
            "loan applied"
        );
        Ok(loan)
    }

    /// Approves or declines a pending loan.
    ///
    /// # Errors
    ///
    /// `Forbidden` without the approve-loan capability, `NotFound`, or
    /// `InvalidTransition` if the loan is not pending.
    pub async fn decide_loan(
        &self,
        loan_id: LoanId,
        decision: LoanDecision,
        actor: &Actor,
    ) -> LedgerResult<Loan> {
        actor.require(capability::APPROVE_LOAN)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = decide_loan_in(
            &mut tx,
            loan_id,
            decision,
            actor.member_id,
            today(),
            &self.config,
        )
        .await;
        let loan = finish(tx, result).await?;

        info!(
            loan_id = %loan_id,
            status = %loan.status,
            decided_by = %actor.member_id,
            "loan decided"
        );

        if let (LoanStatus::Approved, Some(first_due)) = (loan.status, loan.next_due_date) {
            let message = self
                .templates
                .loan_approved(self.money(loan.principal), first_due);
            self.notify_member(loan.member_id, message).await;
        }
        Ok(loan)
    }

    /// Records a repayment against an approved or active loan.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive or unstorable amount or an
    /// overpayment under the reject policy, `InvalidInput` if the next due date
    /// would be out of range, `Forbidden` if the actor neither owns the loan nor is an
    /// admin, `NotFound`, or `InvalidTransition` for pending, declined or
    /// closed loans.
    pub async fn record_repayment(
        &self,
        loan_id: LoanId,
        amount: Decimal,
        date: NaiveDate,
        actor: &Actor,
    ) -> LedgerResult<RepaymentReceipt> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        self.check_amount(amount)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = record_repayment_in(&mut tx, loan_id, amount, date, actor, &self.config).await;
        let receipt = finish(tx, result).await?;

        info!(
            loan_id = %loan_id,
            repayment_id = %receipt.repayment.id,
            amount = %amount,
            outstanding = %receipt.loan.outstanding_balance,
            status = %receipt.loan.status,
            "repayment recorded"
        );

        let message = self
            .templates
            .repayment_received(self.money(amount), date);
        self.notify_member(receipt.loan.member_id, message).await;
        Ok(receipt)
    }

    // ========== Dividends ==========

    /// Computes each member's dividend without persisting anything.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative or unstorable profit, `Inconsistent` if
    /// the basis totals overflow.
    pub async fn compute_dividends(
        &self,
        basis: DividendBasis,
        total_profit: Decimal,
    ) -> LedgerResult<Vec<DividendRecord>> {
        if total_profit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(total_profit));
        }
        self.check_amount(total_profit)?;

        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = basis_entries_in(&mut tx, basis).await;
        let entries = finish(tx, result).await?;

        DividendAllocator::allocate(&entries, total_profit, self.config.currency.minor_units())
    }

    /// Computes and persists a dividend run for `year`.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless the actor is an admin, `InvalidAmount` for a
    /// negative or unstorable profit.
    pub async fn distribute_dividends(
        &self,
        year: i32,
        basis: DividendBasis,
        total_profit: Decimal,
        actor: &Actor,
    ) -> LedgerResult<DividendRun> {
        actor.require(capability::ADMIN)?;
        if total_profit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(total_profit));
        }
        self.check_amount(total_profit)?;

        let mut tx = self.store.begin(Isolation::Serializable).await?;
        let result = distribute_dividends_in(
            &mut tx,
            year,
            basis,
            total_profit,
            self.config.currency.minor_units(),
        )
        .await;
        let run = finish(tx, result).await?;

        info!(
            run_id = %run.id,
            year,
            basis = %basis,
            total_profit = %total_profit,
            distributed = %run.total_distributed(),
            members = run.records.len(),
            "dividends distributed"
        );
        Ok(run)
    }

    /// Persisted dividend runs, newest year first.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn dividend_runs(&self) -> LedgerResult<Vec<DividendRun>> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = tx.dividend_runs().await.map_err(LedgerError::from);
        let mut runs = finish(tx, result).await?;
        runs.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then(b.computed_on.cmp(&a.computed_on))
                .then(b.id.cmp(&a.id))
        });
        Ok(runs)
    }

    // ========== Reports and queries ==========

    /// Cooperative-wide totals.
    ///
    /// # Errors
    ///
    /// Store failures, or `Inconsistent` if a total overflows.
    pub async fn summary(&self) -> LedgerResult<LedgerSummary> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = summary_rows_in(&mut tx).await;
        let (members, loans) = finish(tx, result).await?;
        LedgerSummary::from_rows(&members, &loans, self.config.currency)
    }

    /// A single member.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown member.
    pub async fn member(&self, id: MemberId) -> LedgerResult<MemberAccount> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = require_member(&mut tx, id).await;
        finish(tx, result).await
    }

    /// Members ordered by name.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn members(&self, page: PageRequest) -> LedgerResult<PageResponse<MemberAccount>> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = tx.members().await.map_err(LedgerError::from);
        let mut members = finish(tx, result).await?;
        members.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page.slice(members))
    }

    /// A member's contributions, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown member.
    pub async fn contributions(
        &self,
        member_id: MemberId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Contribution>> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = member_contributions_in(&mut tx, member_id).await;
        let mut contributions = finish(tx, result).await?;
        contributions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(page.slice(contributions))
    }

    /// Loans, optionally for one member, newest application first.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn loans(
        &self,
        member_id: Option<MemberId>,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Loan>> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = tx.loans(member_id).await.map_err(LedgerError::from);
        let mut loans = finish(tx, result).await?;
        loans.sort_by(|a, b| b.applied_date.cmp(&a.applied_date).then(b.id.cmp(&a.id)));
        Ok(page.slice(loans))
    }

    /// A single loan.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown loan.
    pub async fn loan(&self, id: LoanId) -> LedgerResult<Loan> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = require_loan(&mut tx, id).await;
        finish(tx, result).await
    }

    /// A loan's repayments, newest first.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown loan.
    pub async fn repayments(
        &self,
        loan_id: LoanId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Repayment>> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = loan_repayments_in(&mut tx, loan_id).await;
        let mut repayments = finish(tx, result).await?;
        repayments.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(page.slice(repayments))
    }

    /// The informational installment schedule of a loan.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown loan, `InvalidInput` if a due date is out of
    /// range.
    pub async fn loan_schedule(&self, id: LoanId) -> LedgerResult<Vec<ScheduleLine>> {
        let loan = self.loan(id).await?;
        loan.repayment_schedule(
            self.config.repayment_cadence(),
            self.config.currency.minor_units(),
        )
    }

    // ========== Notifications ==========

    /// Reminds borrowers whose next payment is due on or before `as_of`.
    ///
    /// Returns the number of reminders handed to the notifier (delivered or
    /// queued).
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn remind_due_loans(&self, as_of: NaiveDate) -> LedgerResult<usize> {
        let mut tx = self.store.begin(Isolation::ConsistentRead).await?;
        let result = summary_rows_in(&mut tx).await;
        let (members, mut loans) = finish(tx, result).await?;

        let members: HashMap<MemberId, MemberAccount> =
            members.into_iter().map(|m| (m.id, m)).collect();
        loans.sort_by(|a, b| a.next_due_date.cmp(&b.next_due_date).then(a.id.cmp(&b.id)));

        let mut reminders = Vec::new();
        for loan in loans {
            let Some(due) = loan.next_due_date else {
                continue;
            };
            if !loan.status.accepts_repayment() || due > as_of {
                continue;
            }
            let Some(member) = members.get(&loan.member_id) else {
                warn!(loan_id = %loan.id, member_id = %loan.member_id, "due loan has no member");
                continue;
            };
            reminders.push(Notification {
                phone: member.phone.clone(),
                message: self.templates.payment_due(
                    &member.name,
                    due,
                    self.money(loan.outstanding_balance),
                ),
            });
        }

        let count = reminders.len();
        for reminder in reminders {
            self.dispatch(reminder).await;
        }
        info!(as_of = %as_of, count, "due reminders sent");
        Ok(count)
    }

    /// Retries every queued notification. Returns how many were delivered;
    /// the rest stay queued.
    pub async fn retry_notifications(&self) -> usize {
        let mut delivered = 0;
        for notification in self.outbox.drain().await {
            match self
                .notifier
                .send(&notification.phone, &notification.message)
                .await
            {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(phone = %notification.phone, error = %err, "notification retry failed");
                    self.outbox.push(notification).await;
                }
            }
        }
        if delivered > 0 {
            info!(delivered, "queued notifications delivered");
        }
        delivered
    }

    /// Notifications waiting for a retry.
    pub async fn pending_notifications(&self) -> Vec<Notification> {
        self.outbox.pending().await
    }

    async fn notify_member(&self, member_id: MemberId, message: String) {
        if !self.notifications.enabled {
            return;
        }
        match self.member(member_id).await {
            Ok(member) => {
                self.dispatch(Notification {
                    phone: member.phone,
                    message,
                })
                .await;
            }
            Err(err) => {
                warn!(member_id = %member_id, error = %err, "cannot look up member for notification");
            }
        }
    }

    async fn dispatch(&self, notification: Notification) {
        if !self.notifications.enabled {
            return;
        }
        if let Err(err) = self
            .notifier
            .send(&notification.phone, &notification.message)
            .await
        {
            warn!(
                phone = %notification.phone,
                error = %err,
                "notification failed, queued for retry"
            );
            self.outbox.push(notification).await;
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Commits on success and rolls back on failure.
async fn finish<Tx: LedgerTransaction, T>(tx: Tx, result: LedgerResult<T>) -> LedgerResult<T> {
    match result {
        Ok(value) => match tx.commit().await {
            Ok(()) => Ok(value),
            Err(StoreError::Conflict) => {
                debug!("transaction aborted by a concurrent update");
                Err(LedgerError::Conflict)
            }
            Err(err) => Err(err.into()),
        },
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn require_member<Tx: LedgerTransaction>(
    tx: &mut Tx,
    id: MemberId,
) -> LedgerResult<MemberAccount> {
    tx.member(id).await?.ok_or(LedgerError::MemberNotFound(id))
}

async fn require_loan<Tx: LedgerTransaction>(tx: &mut Tx, id: LoanId) -> LedgerResult<Loan> {
    tx.loan(id).await?.ok_or(LedgerError::LoanNotFound(id))
}

async fn register_member_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    new_member: NewMember,
) -> LedgerResult<MemberAccount> {
    let mut account = MemberAccount::new(new_member.name, new_member.phone, new_member.shares);
    if new_member.opening_savings > Decimal::ZERO {
        let contribution = Contribution::new(
            account.id,
            new_member.opening_savings,
            new_member.joined_on,
            Some("Opening savings".to_string()),
        );
        account.deposit(contribution.amount)?;
        tx.put_contribution(contribution).await?;
    }
    tx.put_member(account.clone()).await?;
    Ok(account)
}

async fn update_shares_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    member_id: MemberId,
    shares: u32,
) -> LedgerResult<MemberAccount> {
    let mut account = require_member(tx, member_id).await?;
    account.shares = shares;
    tx.put_member(account.clone()).await?;
    Ok(account)
}

async fn record_contribution_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    member_id: MemberId,
    amount: Decimal,
    date: NaiveDate,
    note: Option<String>,
) -> LedgerResult<Contribution> {
    let mut account = require_member(tx, member_id).await?;
    let contribution = Contribution::new(member_id, amount, date, note);
    account.deposit(amount)?;
    tx.put_member(account).await?;
    tx.put_contribution(contribution.clone()).await?;
    Ok(contribution)
}

async fn reverse_contribution_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    id: ContributionId,
) -> LedgerResult<Contribution> {
    let contribution = tx
        .contribution(id)
        .await?
        .ok_or(LedgerError::ContributionNotFound(id))?;
    let mut account = require_member(tx, contribution.member_id).await?;
    account.reverse_deposit(contribution.amount)?;
    tx.put_member(account).await?;
    tx.delete_contribution(id).await?;
    Ok(contribution)
}

async fn apply_loan_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    application: LoanApplication,
    applied_date: NaiveDate,
) -> LedgerResult<Loan> {
    require_member(tx, application.member_id).await?;
    let loan = Loan::pending(application, applied_date);
    tx.put_loan(loan.clone()).await?;
    Ok(loan)
}

async fn decide_loan_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    loan_id: LoanId,
    decision: LoanDecision,
    decided_by: MemberId,
    today: NaiveDate,
    config: &LedgerConfig,
) -> LedgerResult<Loan> {
    let mut loan = require_loan(tx, loan_id).await?;
    LoanLifecycle::decide(&loan, decision, decided_by, today, config.repayment_cadence())?
        .apply(&mut loan);
    tx.put_loan(loan.clone()).await?;
    Ok(loan)
}

async fn record_repayment_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    loan_id: LoanId,
    amount: Decimal,
    date: NaiveDate,
    actor: &Actor,
    config: &LedgerConfig,
) -> LedgerResult<RepaymentReceipt> {
    let mut loan = require_loan(tx, loan_id).await?;
    if loan.member_id != actor.member_id && !actor.is_admin() {
        return Err(LedgerError::NotLoanOwner {
            actor: actor.member_id,
            loan: loan_id,
        });
    }

    LoanLifecycle::repay(
        &loan,
        amount,
        date,
        config.repayment_cadence(),
        config.overpayment,
    )?
    .apply(&mut loan);

    let repayment = Repayment::new(loan_id, amount, date, actor.member_id);
    tx.put_repayment(repayment.clone()).await?;
    tx.put_loan(loan.clone()).await?;
    Ok(RepaymentReceipt { loan, repayment })
}

async fn basis_entries_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    basis: DividendBasis,
) -> LedgerResult<Vec<BasisEntry>> {
    let mut members = tx.members().await?;
    members.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let contributed: HashMap<MemberId, Decimal> = match basis {
        DividendBasis::Shares => HashMap::new(),
        DividendBasis::Contributions => {
            let mut totals = HashMap::new();
            for contribution in tx.contributions(None).await? {
                let total = totals.entry(contribution.member_id).or_insert(Decimal::ZERO);
                *total = add_within_limit(*total, contribution.amount)
                    .ok_or(LedgerError::Overflow("contribution basis"))?;
            }
            totals
        }
    };

    Ok(members
        .into_iter()
        .map(|member| {
            let value = match basis {
                DividendBasis::Shares => Decimal::from(member.shares),
                DividendBasis::Contributions => contributed
                    .get(&member.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO),
            };
            BasisEntry {
                member_id: member.id,
                member_name: member.name,
                value,
            }
        })
        .collect())
}

async fn distribute_dividends_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    year: i32,
    basis: DividendBasis,
    total_profit: Decimal,
    decimal_places: u32,
) -> LedgerResult<DividendRun> {
    let entries = basis_entries_in(tx, basis).await?;
    let run = DividendRun {
        id: DividendRunId::new(),
        year,
        basis,
        total_profit,
        computed_on: today(),
        records: DividendAllocator::allocate(&entries, total_profit, decimal_places)?,
    };
    tx.put_dividend_run(run.clone()).await?;
    Ok(run)
}

async fn summary_rows_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
) -> LedgerResult<(Vec<MemberAccount>, Vec<Loan>)> {
    let members = tx.members().await?;
    let loans = tx.loans(None).await?;
    Ok((members, loans))
}

async fn member_contributions_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    member_id: MemberId,
) -> LedgerResult<Vec<Contribution>> {
    require_member(tx, member_id).await?;
    Ok(tx.contributions(Some(member_id)).await?)
}

async fn loan_repayments_in<Tx: LedgerTransaction>(
    tx: &mut Tx,
    loan_id: LoanId,
) -> LedgerResult<Vec<Repayment>> {
    require_loan(tx, loan_id).await?;
    Ok(tx.repayments(loan_id).await?)
}
