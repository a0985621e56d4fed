//! The primary store abstraction.
//!
//! Every read path takes an explicit `tenant_id`; there is no way to ask a
//! [`LogStore`] for an entry without naming the tenant that owns it. Writes
//! are idempotent on `(tenant_id, log_id)` so the queue's at-least-once
//! delivery collapses to exactly-once storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scribe_core::{LogAction, LogEntry, LogSeverity};
use uuid::Uuid;

use crate::error::StoreError;

/// Result of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The entry was written for the first time.
    Inserted,
    /// An identical entry was already stored; the write was a no-op.
    AlreadyPresent,
}

/// Filter for listing stored entries within one tenant.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Filter by acting user.
    pub user_id: Option<String>,
    /// Filter by action.
    pub action: Option<LogAction>,
    /// Filter by resource type.
    pub resource_type: Option<String>,
    /// Filter by resource ID.
    pub resource_id: Option<String>,
    /// Filter by severity.
    pub severity: Option<LogSeverity>,
    /// Only entries at or after this time.
    pub start_time: Option<DateTime<Utc>>,
    /// Only entries at or before this time.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

/// Trait for primary store backends.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Insert an entry if `(tenant_id, log_id)` is not yet stored.
    ///
    /// Re-inserting an identical entry returns
    /// [`UpsertOutcome::AlreadyPresent`]. Re-inserting the same key with
    /// different content returns [`StoreError::Conflict`] and leaves the
    /// stored entry untouched.
    async fn upsert(&self, entry: &LogEntry) -> Result<UpsertOutcome, StoreError>;

    /// Fetch one entry by its tenant-scoped identity.
    async fn get(&self, tenant_id: &str, log_id: Uuid) -> Result<Option<LogEntry>, StoreError>;

    /// List entries for one tenant, newest first.
    async fn list(&self, tenant_id: &str, filter: LogFilter) -> Result<Vec<LogEntry>, StoreError>;

    /// Number of entries stored for one tenant.
    async fn count(&self, tenant_id: &str) -> Result<u64, StoreError>;
}

/// Content equality for conflict detection.
///
/// Timestamps are compared at microsecond precision because TIMESTAMPTZ
/// columns do not keep nanoseconds; an entry must compare equal to its own
/// round trip through a backend.
pub(crate) fn content_matches(stored: &LogEntry, incoming: &LogEntry) -> bool {
    if stored.timestamp.timestamp_micros() != incoming.timestamp.timestamp_micros() {
        return false;
    }
    let mut normalized = incoming.clone();
    normalized.timestamp = stored.timestamp;
    *stored == normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use scribe_core::LogSubmission;

    fn entry_at(nanos: u32) -> LogEntry {
        let ts = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .unwrap()
            .with_nanosecond(nanos)
            .unwrap();
        LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Create,
            "invoice",
            "inv-1",
            "created invoice",
        )
        .timestamp(ts)
        .build()
        .into_entry(Uuid::nil(), ts)
    }

    #[test]
    fn test_content_matches_ignores_sub_microsecond_drift() {
        let a = entry_at(123_456_789);
        let b = entry_at(123_456_000);
        assert!(content_matches(&a, &b));
    }

    #[test]
    fn test_content_matches_rejects_different_message() {
        let a = entry_at(0);
        let mut b = entry_at(0);
        b.message = "created a different invoice".to_string();
        assert!(!content_matches(&a, &b));
    }

    #[test]
    fn test_content_matches_rejects_microsecond_drift() {
        let a = entry_at(1_000);
        let b = entry_at(2_000);
        assert!(!content_matches(&a, &b));
    }
}
