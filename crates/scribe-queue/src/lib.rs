//! # scribe-queue
//!
//! Durable queue backends for the Scribe audit-log pipeline.
//!
//! The queue hands each message to at most one consumer at a time under a
//! lease. Consumers settle a lease by acknowledging (done), releasing
//! (retry later) or dead-lettering (never retry); an unsettled lease
//! expires after the visibility timeout and the message is redelivered
//! with its attempt counter incremented. After `max_attempts` deliveries
//! the queue parks the message in the dead-letter store together with its
//! failure history.
//!
//! Two backends share these semantics:
//!
//! - [`MemoryQueue`]: in-process, for tests and development mode
//! - [`PgQueue`]: Postgres tables with `FOR UPDATE SKIP LOCKED` leasing
//!
//! Messages are serialized with the versioned wire codec from
//! `scribe_core::codec` on both backends.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod queue;

pub use error::QueueError;
pub use memory::MemoryQueue;
pub use postgres::PgQueue;
pub use queue::{DurableQueue, Leased, QueueDepth, QueueOptions};

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use scribe_core::config::{QueueBackend, QueueConfig};
use scribe_core::{Envelope, ReindexRequest};

/// The two queues the pipeline runs on.
#[derive(Clone)]
pub struct QueueHandles {
    /// Envelopes awaiting processing.
    pub ingest: Arc<dyn DurableQueue<Envelope>>,

    /// Re-index requests for entries whose search indexing failed.
    pub reindex: Arc<dyn DurableQueue<ReindexRequest>>,
}

/// Create both queues from configuration.
///
/// The postgres backend shares one connection pool between the queues and
/// creates their tables if missing.
pub async fn create_queues(config: &QueueConfig) -> Result<QueueHandles, QueueError> {
    let ingest_options = QueueOptions::new(format!("{}_ingest", config.table_prefix))
        .visibility_timeout(Duration::from_secs(config.visibility_timeout_secs))
        .max_attempts(config.max_attempts);
    let reindex_options = QueueOptions::new(format!("{}_reindex", config.table_prefix))
        .visibility_timeout(Duration::from_secs(config.visibility_timeout_secs))
        .max_attempts(config.reindex_max_attempts);

    match config.backend {
        QueueBackend::Memory => Ok(QueueHandles {
            ingest: Arc::new(MemoryQueue::new(ingest_options)),
            reindex: Arc::new(MemoryQueue::new(reindex_options)),
        }),
        QueueBackend::Postgres => {
            let url = config.url.as_deref().ok_or_else(|| {
                QueueError::Unavailable("queue.url is not configured".to_string())
            })?;
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;

            let ingest = PgQueue::new(pool.clone(), ingest_options)?;
            ingest.ensure_schema().await?;
            let reindex = PgQueue::new(pool, reindex_options)?;
            reindex.ensure_schema().await?;

            Ok(QueueHandles {
                ingest: Arc::new(ingest),
                reindex: Arc::new(reindex),
            })
        }
    }
}
