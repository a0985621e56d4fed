//! The durable queue contract.
//!
//! Delivery is at-least-once. A consumer takes a [`Leased`] message, and
//! the message stays invisible until the lease is settled or its
//! visibility timeout passes. Settling with a stale token (after expiry
//! and re-lease) is a no-op reported as `false`, never an error.
//!
//! Attempt accounting: the stored counter is incremented when a lease is
//! granted, so the first delivery observes attempt 1. A message whose
//! counter has reached `max_attempts` is moved to the dead-letter store
//! instead of being delivered again. An always-failing message is
//! therefore delivered exactly `max_attempts` times.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use scribe_core::DeadLetterRecord;
use scribe_core::envelope::FailureRecord;

use crate::error::QueueError;

/// Dead-letter reason for a message that ran out its budget: the last
/// recorded failure, or a generic note when nothing was ever reported.
pub(crate) fn exhaustion_reason(failures: &[FailureRecord]) -> String {
    failures
        .last()
        .map(|f| f.reason.clone())
        .unwrap_or_else(|| "retry budget exhausted".to_string())
}

/// A message held under a lease.
#[derive(Debug, Clone)]
pub struct Leased<M> {
    /// The decoded message.
    pub message: M,

    /// Settlement token for this lease only.
    pub token: Uuid,

    /// Which delivery this is, starting at 1.
    pub delivery_attempt: u32,

    /// When the lease lapses and the message becomes leasable again.
    pub leased_until: DateTime<Utc>,
}

/// Queue population counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct QueueDepth {
    /// Messages leasable right now.
    pub ready: u64,

    /// Messages under an active lease.
    pub leased: u64,

    /// Messages parked in the dead-letter store.
    pub dead_lettered: u64,
}

/// Tuning for one queue instance.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Name used in logs and, for database backends, table identifiers.
    pub name: String,

    /// How long a lease lasts.
    pub visibility_timeout: Duration,

    /// Deliveries before a message is dead-lettered.
    pub max_attempts: u32,
}

impl QueueOptions {
    /// Create options with the given name and defaults for the rest.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility_timeout: Duration::from_secs(30),
            max_attempts: 5,
        }
    }

    /// Set the visibility timeout.
    pub fn visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Set the delivery budget.
    pub fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }
}

/// A durable, at-least-once message queue.
#[async_trait]
pub trait DurableQueue<M>: Send + Sync
where
    M: Send + Sync + 'static,
{
    /// Append a message. Durable once this returns.
    async fn publish(&self, message: &M) -> Result<(), QueueError>;

    /// Append several messages in order.
    async fn publish_all(&self, messages: &[M]) -> Result<(), QueueError> {
        for message in messages {
            self.publish(message).await?;
        }
        Ok(())
    }

    /// Lease the oldest available message, if any.
    ///
    /// Messages that exhausted their delivery budget are moved to the
    /// dead-letter store during the scan and are never returned.
    async fn lease(&self) -> Result<Option<Leased<M>>, QueueError>;

    /// Settle a lease as fully processed, removing the message.
    ///
    /// Returns `false` when the token no longer holds the lease.
    async fn acknowledge(&self, token: Uuid) -> Result<bool, QueueError>;

    /// Give a leased message back for redelivery.
    ///
    /// A reason, when given, is recorded in the message's failure history
    /// and becomes the dead-letter reason if the budget runs out. A message
    /// already at its budget is dead-lettered instead of requeued.
    ///
    /// Returns `false` when the token no longer holds the lease.
    async fn release(&self, token: Uuid, reason: Option<String>) -> Result<bool, QueueError>;

    /// Settle a lease by dead-lettering the message immediately.
    ///
    /// Used for permanent failures where redelivery can never succeed.
    /// Returns `false` when the token no longer holds the lease.
    async fn dead_letter(&self, token: Uuid, reason: String) -> Result<bool, QueueError>;

    /// Current population counts.
    async fn depth(&self) -> Result<QueueDepth, QueueError>;

    /// All dead-lettered messages, oldest first.
    async fn dead_letters(&self) -> Result<Vec<DeadLetterRecord<M>>, QueueError>;
}
