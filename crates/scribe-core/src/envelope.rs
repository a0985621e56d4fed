//! Queue message wrappers.
//!
//! An [`Envelope`] wraps a [`LogEntry`] for transport through the durable
//! queue. Envelopes are immutable once published; delivery bookkeeping
//! (attempt numbers, lease tokens) lives in the queue, not in the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::LogEntry;

/// A log entry wrapped for queue transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The wrapped entry.
    pub entry: LogEntry,

    /// When the envelope was published.
    pub enqueued_at: DateTime<Utc>,

    /// Attempt counter at publish time. Always 0; the queue reports the
    /// live attempt number on each lease.
    pub delivery_attempt: u32,

    /// Deduplication key (`tenant_id:log_id`).
    pub dedup_key: String,
}

impl Envelope {
    /// Wrap an entry for publishing.
    pub fn new(entry: LogEntry) -> Self {
        let dedup_key = entry.dedup_key();
        Self {
            entry,
            enqueued_at: Utc::now(),
            delivery_attempt: 0,
            dedup_key,
        }
    }
}

/// One failed processing attempt, as reported back to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Which delivery attempt failed.
    pub attempt: u32,

    /// Why it failed.
    pub reason: String,

    /// When the failure was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// A message that exhausted its retry budget or hit a permanent error.
///
/// Carries the original message untouched so it can be replayed manually
/// once the underlying problem is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord<M = Envelope> {
    /// The original message as published.
    pub message: M,

    /// Last known failure reason.
    pub reason: String,

    /// How many deliveries were attempted.
    pub delivery_attempts: u32,

    /// Per-attempt failure history, oldest first.
    #[serde(default)]
    pub failures: Vec<FailureRecord>,

    /// When the message was dead-lettered.
    pub dead_lettered_at: DateTime<Utc>,
}

/// Request to re-index a stored entry whose search indexing failed.
///
/// Carries only the entry identity. The re-index worker re-reads the
/// authoritative record from the primary store before indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexRequest {
    /// Owning tenant.
    pub tenant_id: String,

    /// Entry to re-index.
    pub log_id: Uuid,

    /// When the re-index was requested.
    pub requested_at: DateTime<Utc>,
}

impl ReindexRequest {
    /// Create a request for the given entry identity.
    pub fn new(tenant_id: impl Into<String>, log_id: Uuid) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            log_id,
            requested_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{LogAction, LogSubmission};

    fn sample_entry() -> LogEntry {
        LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Create,
            "order",
            "ord-1",
            "Order created",
        )
        .build()
        .into_entry(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_envelope_starts_at_attempt_zero() {
        let envelope = Envelope::new(sample_entry());
        assert_eq!(envelope.delivery_attempt, 0);
    }

    #[test]
    fn test_envelope_carries_dedup_key() {
        let entry = sample_entry();
        let expected = entry.dedup_key();
        let envelope = Envelope::new(entry);
        assert_eq!(envelope.dedup_key, expected);
    }

    #[test]
    fn test_dead_letter_record_round_trips() {
        let envelope = Envelope::new(sample_entry());
        let record = DeadLetterRecord {
            message: envelope,
            reason: "store unavailable".to_string(),
            delivery_attempts: 5,
            failures: vec![FailureRecord {
                attempt: 5,
                reason: "store unavailable".to_string(),
                occurred_at: Utc::now(),
            }],
            dead_lettered_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let parsed: DeadLetterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.delivery_attempts, 5);
        assert_eq!(parsed.failures.len(), 1);
    }
}
