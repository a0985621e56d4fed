//! In-memory search backend for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use scribe_core::LogEntry;
use uuid::Uuid;

use crate::error::SearchError;
use crate::index::SearchIndex;

type TenantDocs = HashMap<String, HashMap<Uuid, LogEntry>>;

/// In-memory [`SearchIndex`] with case-insensitive substring matching.
///
/// Matches against `message`, `resource_type`, `resource_id`, `user_id` and
/// the action name.
#[derive(Default)]
pub struct MemorySearchIndex {
    docs: RwLock<TenantDocs>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TenantDocs>, SearchError> {
        self.docs
            .read()
            .map_err(|e| SearchError::Unavailable(format!("index lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TenantDocs>, SearchError> {
        self.docs
            .write()
            .map_err(|e| SearchError::Unavailable(format!("index lock poisoned: {e}")))
    }

    /// Number of documents indexed for one tenant.
    pub fn doc_count(&self, tenant_id: &str) -> usize {
        self.read()
            .map(|docs| docs.get(tenant_id).map_or(0, HashMap::len))
            .unwrap_or(0)
    }
}

fn matches(entry: &LogEntry, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    entry.message.to_lowercase().contains(&needle)
        || entry.resource_type.to_lowercase().contains(&needle)
        || entry.resource_id.to_lowercase().contains(&needle)
        || entry.user_id.to_lowercase().contains(&needle)
        || entry.action.to_string().to_lowercase().contains(&needle)
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index(&self, entry: &LogEntry) -> Result<(), SearchError> {
        let mut docs = self.write()?;
        docs.entry(entry.tenant_id.clone())
            .or_default()
            .insert(entry.log_id, entry.clone());
        Ok(())
    }

    async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LogEntry>, SearchError> {
        let docs = self.read()?;
        let Some(tenant_docs) = docs.get(tenant_id) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<LogEntry> = tenant_docs
            .values()
            .filter(|e| matches(e, query))
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.log_id.cmp(&a.log_id))
        });
        results.truncate(limit);
        Ok(results)
    }
}
