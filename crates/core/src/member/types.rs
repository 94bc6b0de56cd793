//! Member domain types.

use chrono::NaiveDate;
use ikimina_shared::types::{ContributionId, MemberId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::add_within_limit;
use crate::error::{LedgerError, LedgerResult};

/// A cooperative member's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAccount {
    /// Stable member id.
    pub id: MemberId,
    /// Display name.
    pub name: String,
    /// Phone number used for notifications.
    pub phone: String,
    /// Number of shares held.
    pub shares: u32,
    /// Current savings balance. Never negative.
    pub savings_balance: Decimal,
}

impl MemberAccount {
    /// Creates an account with a zero savings balance.
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>, shares: u32) -> Self {
        Self {
            id: MemberId::new(),
            name: name.into(),
            phone: phone.into(),
            shares,
            savings_balance: Decimal::ZERO,
        }
    }

    /// Credits a contribution to the savings balance.
    ///
    /// # Errors
    ///
    /// Returns `SavingsLimit` if the balance would exceed the storable maximum.
    pub fn deposit(&mut self, amount: Decimal) -> LedgerResult<()> {
        self.savings_balance = add_within_limit(self.savings_balance, amount).ok_or(
            LedgerError::SavingsLimit {
                member: self.id,
                balance: self.savings_balance,
                amount,
            },
        )?;
        Ok(())
    }

    /// Debits a reversed contribution from the savings balance.
    ///
    /// # Errors
    ///
    /// Returns `NegativeBalance` if the balance would drop below zero.
    pub fn reverse_deposit(&mut self, amount: Decimal) -> LedgerResult<()> {
        let remaining = self.savings_balance - amount;
        if remaining < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance {
                member: self.id,
                balance: self.savings_balance,
                amount,
            });
        }
        self.savings_balance = remaining;
        Ok(())
    }
}

/// Input for registering a new member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Initial share count.
    pub shares: u32,
    /// Savings brought in at registration, booked as the first contribution.
    pub opening_savings: Decimal,
    /// Registration date.
    pub joined_on: NaiveDate,
}

impl NewMember {
    /// Checks the registration input before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank name or phone and
    /// `NegativeAmount` for negative opening savings.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::MissingField("name"));
        }
        if self.phone.trim().is_empty() {
            return Err(LedgerError::MissingField("phone"));
        }
        if self.opening_savings < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount(self.opening_savings));
        }
        Ok(())
    }
}

/// A savings contribution in the member journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Contribution id.
    pub id: ContributionId,
    /// Contributing member.
    pub member_id: MemberId,
    /// Value date.
    pub date: NaiveDate,
    /// Amount credited. Always positive.
    pub amount: Decimal,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl Contribution {
    /// Creates a contribution with a fresh id.
    #[must_use]
    pub fn new(member_id: MemberId, amount: Decimal, date: NaiveDate, note: Option<String>) -> Self {
        Self {
            id: ContributionId::new(),
            member_id,
            date,
            amount,
            note,
        }
    }
}
