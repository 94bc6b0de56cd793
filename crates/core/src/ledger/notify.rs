//! Member notifications.
//!
//! Messages go out after the ledger transaction commits. A delivery failure
//! never undoes ledger state; the message is parked in the outbox instead.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use ikimina_shared::types::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Notification delivery errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The gateway refused or failed to deliver the message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound message channel (SMS gateway or similar).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to `phone`.
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError>;
}

/// A message addressed to a member's phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Destination phone number.
    pub phone: String,
    /// Rendered message text.
    pub message: String,
}

/// Notifier that writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        info!(phone, message, "notification sent");
        Ok(())
    }
}

/// Notifier that keeps every delivered message in memory.
///
/// Can be told to fail the next few deliveries.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failures: Arc<AtomicUsize>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next `count` deliveries.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Messages delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, phone: &str, message: &str) -> Result<(), NotifyError> {
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(NotifyError::Delivery("gateway unavailable".to_string()));
        }
        self.sent.lock().await.push(Notification {
            phone: phone.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Queue size used when none is configured.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 1000;

/// Bounded queue of undelivered notifications.
#[derive(Debug, Clone)]
pub struct Outbox {
    queue: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl Outbox {
    /// Creates an outbox holding at most `capacity` notifications (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    /// Parks a notification for a later retry, dropping the oldest queued
    /// one when the outbox is full.
    pub async fn push(&self, notification: Notification) {
        let mut queue = self.queue.lock().await;
        while queue.len() >= self.capacity {
            if let Some(dropped) = queue.pop_front() {
                warn!(
                    phone = %dropped.phone,
                    capacity = self.capacity,
                    "outbox full, dropping oldest notification"
                );
            }
        }
        queue.push_back(notification);
    }

    /// Takes every queued notification.
    pub async fn drain(&self) -> Vec<Notification> {
        self.queue.lock().await.drain(..).collect()
    }

    /// Snapshot of the queue.
    pub async fn pending(&self) -> Vec<Notification> {
        self.queue.lock().await.iter().cloned().collect()
    }
}

/// Message texts sent to members.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    sender_id: String,
}

impl MessageTemplates {
    /// Creates templates signed with `sender_id`.
    #[must_use]
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
        }
    }

    /// Loan approval notice.
    #[must_use]
    pub fn loan_approved(&self, principal: Money, first_due: NaiveDate) -> String {
        format!(
            "Your loan of {principal} is approved. First due: {first_due}. - {}",
            self.sender_id
        )
    }

    /// Repayment receipt.
    #[must_use]
    pub fn repayment_received(&self, amount: Money, date: NaiveDate) -> String {
        format!(
            "Payment received: {amount} on {date}. Thank you! - {}",
            self.sender_id
        )
    }

    /// Due-date reminder.
    #[must_use]
    pub fn payment_due(&self, name: &str, due: NaiveDate, amount: Money) -> String {
        format!(
            "Hello {name}, your next loan payment is due on {due}. Amount: {amount}. - {}",
            self.sender_id
        )
    }
}
