//! The search index abstraction.

use async_trait::async_trait;
use scribe_core::LogEntry;

use crate::error::SearchError;

/// Trait for search index backends.
///
/// Indexing is keyed by `(tenant_id, log_id)` like the primary store, so
/// re-indexing an entry replaces its document instead of duplicating it.
/// Queries are always scoped to one tenant; the index never exposes a
/// cross-tenant view.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Add or replace an entry's document in its tenant's namespace.
    async fn index(&self, entry: &LogEntry) -> Result<(), SearchError>;

    /// Full-text search within one tenant, newest first.
    ///
    /// A blank query matches every document the tenant has.
    async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LogEntry>, SearchError>;
}
