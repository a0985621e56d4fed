//! # scribe-worker
//!
//! Consumers for the Scribe pipeline's two queues.
//!
//! Ingest workers lease envelopes and run the settlement protocol: upsert
//! into the primary store, index for search, then acknowledge. Failures
//! settle according to their class:
//!
//! - transient infrastructure errors retry, first by immediate release and
//!   past [`WorkerConfig::release_threshold`] by letting the lease expire
//! - permanent errors dead-letter the envelope directly
//! - integrity conflicts dead-letter the envelope and leave the stored
//!   entry untouched
//! - index failures never block durability: the entry stays stored, a
//!   re-index request is scheduled and the envelope is acknowledged
//!
//! Re-index workers drain the repair queue with their own, smaller retry
//! budget.

use std::sync::Arc;

use async_trait::async_trait;
use scribe_core::{PipelineMetrics, WorkerConfig};
use scribe_queue::{QueueError, QueueHandles};
use scribe_search::SearchIndex;
use scribe_store::LogStore;

pub mod pool;
pub mod processor;
pub mod reindex;

pub use pool::WorkerPool;
pub use processor::Processor;
pub use reindex::ReindexProcessor;

/// Shared handles a worker needs to do its job.
///
/// Everything is injected; nothing here reaches for a global.
#[derive(Clone)]
pub struct WorkerContext {
    pub queues: QueueHandles,
    pub store: Arc<dyn LogStore>,
    pub search: Arc<dyn SearchIndex>,
    pub metrics: Arc<PipelineMetrics>,
    pub config: WorkerConfig,
}

/// A unit the pool can drive in a poll loop.
#[async_trait]
pub trait QueueWorker: Send + Sync {
    /// Label for logs.
    fn kind(&self) -> &'static str;

    /// Lease and settle at most one message.
    ///
    /// Returns `Ok(true)` when a message was processed and `Ok(false)` when
    /// the queue was empty. Errors are queue-level failures; message-level
    /// failures settle internally and are not errors here.
    async fn process_next(&self) -> Result<bool, QueueError>;
}
