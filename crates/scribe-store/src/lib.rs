//! # scribe-store
//!
//! Primary store for audit-log entries.
//!
//! The store is the system of record: an entry that reached it is durable
//! even when downstream indexing lags or fails. Writes are idempotent on
//! `(tenant_id, log_id)` and every read requires a tenant, so one tenant can
//! never see or collide with another tenant's entries.
//!
//! Two backends:
//!
//! - [`MemoryLogStore`]: process-local, for tests and dev setups
//! - [`PgLogStore`]: a Postgres table keyed by `(tenant_id, log_id)`

use std::sync::Arc;

use scribe_core::config::{StoreBackend, StoreConfig};

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryLogStore;
pub use postgres::PgLogStore;
pub use store::{LogFilter, LogStore, UpsertOutcome};

/// Create a store backend from configuration.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn LogStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryLogStore::new())),
        StoreBackend::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| {
                StoreError::Unavailable("store.url is not configured".to_string())
            })?;
            let store = PgLogStore::connect(url, config.max_connections).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
