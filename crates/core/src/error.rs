//! Ledger error types.
//!
//! Every failure of a ledger operation is a [`LedgerError`]. Variants carry the
//! details a caller needs to explain the failure; [`LedgerError::kind`] collapses
//! them into the coarse [`ErrorKind`] classification callers branch on.

use chrono::NaiveDate;
use ikimina_shared::types::{ContributionId, LoanId, MemberId};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::loan::LoanStatus;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Coarse classification of ledger failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A monetary amount or rate is out of range.
    InvalidAmount,
    /// A loan term is not a positive number of months.
    InvalidTerm,
    /// A non-monetary input field is missing or malformed.
    InvalidInput,
    /// A referenced member, contribution or loan does not exist.
    NotFound,
    /// The loan's current status does not allow the operation.
    InvalidTransition,
    /// The actor lacks the capability or ownership the operation needs.
    Forbidden,
    /// A concurrent transaction touched the same rows; safe to retry.
    Conflict,
    /// A stored invariant is violated or the store failed unexpectedly.
    Inconsistent,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount cannot be negative.
    #[error("Amount cannot be negative, got {0}")]
    NegativeAmount(Decimal),

    /// Interest rate cannot be negative.
    #[error("Interest rate cannot be negative, got {0}")]
    NegativeInterestRate(Decimal),

    /// Repayment larger than the loan's outstanding balance.
    #[error("Repayment of {amount} exceeds outstanding balance {outstanding}")]
    Overpayment {
        /// The attempted repayment amount.
        amount: Decimal,
        /// The loan's outstanding balance.
        outstanding: Decimal,
    },

    /// Amount has more decimal places than the currency allows.
    #[error("Amount {amount} has more than {decimal_places} decimal places")]
    TooManyDecimalPlaces {
        /// The rejected amount.
        amount: Decimal,
        /// Decimal places the ledger keeps.
        decimal_places: u32,
    },

    /// Amount is larger than a money column can hold.
    #[error("Amount {0} exceeds the largest storable amount")]
    AmountOutOfRange(Decimal),

    /// Interest rate is too large or too precise to store.
    #[error("Interest rate {0} must be below 1000 with at most 6 decimal places")]
    InterestRateOutOfRange(Decimal),

    /// A deposit would push savings past the largest storable amount.
    #[error("Depositing {amount} would take member {member} past the savings limit (balance {balance})")]
    SavingsLimit {
        /// The member being credited.
        member: MemberId,
        /// The member's current savings balance.
        balance: Decimal,
        /// The amount being deposited.
        amount: Decimal,
    },

    /// Loan term is outside the accepted range of months.
    #[error("Loan term must be between 1 and {max} months, got {term}")]
    InvalidTerm {
        /// The rejected term.
        term: u32,
        /// Longest accepted term.
        max: u32,
    },

    /// A due date would fall outside the calendar.
    #[error("Due date after {0} is out of range")]
    DateOutOfRange(NaiveDate),

    /// A required text field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    // ========== Lookup Errors ==========
    /// Member not found.
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// Contribution not found.
    #[error("Contribution not found: {0}")]
    ContributionNotFound(ContributionId),

    /// Loan not found.
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    // ========== Loan State Errors ==========
    /// The loan's status does not allow the requested action.
    #[error("Cannot {action} a loan that is {from}")]
    InvalidTransition {
        /// The loan's current status.
        from: LoanStatus,
        /// The attempted action.
        action: &'static str,
    },

    // ========== Permission Errors ==========
    /// The actor lacks a required capability.
    #[error("Member {actor} lacks the {capability} capability")]
    MissingCapability {
        /// The acting member.
        actor: MemberId,
        /// The capability that was required.
        capability: &'static str,
    },

    /// The actor tried to repay a loan owned by another member.
    #[error("Member {actor} cannot repay loan {loan} owned by another member")]
    NotLoanOwner {
        /// The acting member.
        actor: MemberId,
        /// The loan being repaid.
        loan: LoanId,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    Conflict,

    // ========== Invariant Errors ==========
    /// Reversal would drive a savings balance below zero.
    #[error("Reversing {amount} would leave member {member} with savings below zero (balance {balance})")]
    NegativeBalance {
        /// The member whose balance would go negative.
        member: MemberId,
        /// The member's current savings balance.
        balance: Decimal,
        /// The amount being reversed.
        amount: Decimal,
    },

    /// An aggregate left the decimal range.
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),

    /// The ledger store failed unexpectedly.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonPositiveAmount(_)
            | Self::NegativeAmount(_)
            | Self::NegativeInterestRate(_)
            | Self::Overpayment { .. }
            | Self::TooManyDecimalPlaces { .. }
            | Self::AmountOutOfRange(_)
            | Self::InterestRateOutOfRange(_)
            | Self::SavingsLimit { .. } => ErrorKind::InvalidAmount,
            Self::InvalidTerm { .. } => ErrorKind::InvalidTerm,
            Self::MissingField(_) | Self::DateOutOfRange(_) => ErrorKind::InvalidInput,
            Self::MemberNotFound(_) | Self::ContributionNotFound(_) | Self::LoanNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::MissingCapability { .. } | Self::NotLoanOwner { .. } => ErrorKind::Forbidden,
            Self::Conflict => ErrorKind::Conflict,
            Self::NegativeBalance { .. } | Self::Overflow(_) | Self::Storage(_) => {
                ErrorKind::Inconsistent
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::NegativeInterestRate(_) => "NEGATIVE_INTEREST_RATE",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::TooManyDecimalPlaces { .. } => "TOO_MANY_DECIMAL_PLACES",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::InterestRateOutOfRange(_) => "INTEREST_RATE_OUT_OF_RANGE",
            Self::SavingsLimit { .. } => "SAVINGS_LIMIT",
            Self::InvalidTerm { .. } => "INVALID_TERM",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
            Self::MemberNotFound(_) => "MEMBER_NOT_FOUND",
            Self::ContributionNotFound(_) => "CONTRIBUTION_NOT_FOUND",
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::MissingCapability { .. } => "MISSING_CAPABILITY",
            Self::NotLoanOwner { .. } => "NOT_LOAN_OWNER",
            Self::Conflict => "CONCURRENT_MODIFICATION",
            Self::NegativeBalance { .. } => "NEGATIVE_BALANCE",
            Self::Overflow(_) => "ARITHMETIC_OVERFLOW",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            // 400 Bad Request - validation errors
            ErrorKind::InvalidAmount | ErrorKind::InvalidTerm | ErrorKind::InvalidInput => 400,
            // 403 Forbidden - permission errors
            ErrorKind::Forbidden => 403,
            // 404 Not Found
            ErrorKind::NotFound => 404,
            // 409 Conflict - lifecycle and concurrency errors
            ErrorKind::InvalidTransition | ErrorKind::Conflict => 409,
            // 500 Internal Server Error
            ErrorKind::Inconsistent => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}
