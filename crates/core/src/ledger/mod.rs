//! Ledger engine, store seam and notifications.

pub mod actor;
pub mod engine;
pub mod memory;
pub mod notify;
pub mod store;
pub mod summary;

#[cfg(test)]
mod engine_props;

pub use actor::{Actor, capability};
pub use engine::{LedgerEngine, RepaymentReceipt};
pub use memory::{MemoryStore, MemoryTransaction};
pub use notify::{
    LogNotifier, MessageTemplates, Notification, Notifier, NotifyError, Outbox, RecordingNotifier,
};
pub use store::{Isolation, LedgerStore, LedgerTransaction, StoreError, StoreResult};
pub use summary::{LedgerSummary, LoanStatusCounts};
