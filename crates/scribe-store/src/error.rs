//! Store error types.

use uuid::Uuid;

/// Errors returned by [`LogStore`](crate::LogStore) backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An entry with the same `(tenant_id, log_id)` already exists with
    /// different content. The caller decides how to surface this; it must
    /// never take the pipeline down.
    #[error("integrity conflict: entry {log_id} for tenant '{tenant_id}' exists with different content")]
    Conflict { tenant_id: String, log_id: Uuid },

    /// A stored row could not be mapped back into a log entry.
    #[error("corrupt stored entry: {0}")]
    Corrupt(String),

    /// The underlying database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend is unreachable or in a broken state.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether retrying the same operation later could succeed.
    ///
    /// Conflicts and corrupt rows are stable outcomes; only infrastructure
    /// failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Unavailable(_))
    }
}
