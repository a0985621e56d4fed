//! In-memory store backend for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use scribe_core::LogEntry;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{LogFilter, LogStore, UpsertOutcome, content_matches};

type EntryMap = HashMap<(String, Uuid), LogEntry>;

/// In-memory [`LogStore`] keyed by `(tenant_id, log_id)`.
#[derive(Default)]
pub struct MemoryLogStore {
    entries: RwLock<EntryMap>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EntryMap>, StoreError> {
        self.entries
            .read()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EntryMap>, StoreError> {
        self.entries
            .write()
            .map_err(|e| StoreError::Unavailable(format!("store lock poisoned: {e}")))
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn upsert(&self, entry: &LogEntry) -> Result<UpsertOutcome, StoreError> {
        let mut entries = self.write()?;
        let key = (entry.tenant_id.clone(), entry.log_id);
        match entries.get(&key) {
            None => {
                entries.insert(key, entry.clone());
                Ok(UpsertOutcome::Inserted)
            }
            Some(stored) if content_matches(stored, entry) => Ok(UpsertOutcome::AlreadyPresent),
            Some(_) => {
                tracing::warn!(
                    tenant_id = %entry.tenant_id,
                    log_id = %entry.log_id,
                    "integrity conflict: same identity, different content"
                );
                Err(StoreError::Conflict {
                    tenant_id: entry.tenant_id.clone(),
                    log_id: entry.log_id,
                })
            }
        }
    }

    async fn get(&self, tenant_id: &str, log_id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        let entries = self.read()?;
        Ok(entries.get(&(tenant_id.to_string(), log_id)).cloned())
    }

    async fn list(&self, tenant_id: &str, filter: LogFilter) -> Result<Vec<LogEntry>, StoreError> {
        let entries = self.read()?;

        let mut results: Vec<LogEntry> = entries
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id)
            .map(|(_, entry)| entry)
            .filter(|e| {
                if let Some(ref user) = filter.user_id {
                    if &e.user_id != user {
                        return false;
                    }
                }
                if let Some(action) = filter.action {
                    if e.action != action {
                        return false;
                    }
                }
                if let Some(ref rt) = filter.resource_type {
                    if &e.resource_type != rt {
                        return false;
                    }
                }
                if let Some(ref rid) = filter.resource_id {
                    if &e.resource_id != rid {
                        return false;
                    }
                }
                if let Some(severity) = filter.severity {
                    if e.severity != severity {
                        return false;
                    }
                }
                if let Some(start) = filter.start_time {
                    if e.timestamp < start {
                        return false;
                    }
                }
                if let Some(end) = filter.end_time {
                    if e.timestamp > end {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        // Newest first, with the ID as a stable tiebreak.
        results.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.log_id.cmp(&a.log_id))
        });

        if let Some(offset) = filter.offset {
            results = results.into_iter().skip(offset).collect();
        }
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    async fn count(&self, tenant_id: &str) -> Result<u64, StoreError> {
        let entries = self.read()?;
        Ok(entries.keys().filter(|(tenant, _)| tenant == tenant_id).count() as u64)
    }
}
