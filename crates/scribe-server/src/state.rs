//! Ingress application state.

use scribe_core::{IngestConfig, PipelineMetrics};
use scribe_ingest::Enqueuer;
use scribe_queue::QueueHandles;
use scribe_search::SearchIndex;
use scribe_store::LogStore;
use std::sync::Arc;

/// Shared application state for the ingress API.
///
/// Every collaborator is handed in at construction. Nothing in here
/// reaches for globals, so tests assemble a state over in-memory
/// backends and production wires the configured ones.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Validating publisher onto the ingest queue.
    enqueuer: Enqueuer,
    /// Both pipeline queues, for depth reporting.
    queues: QueueHandles,
    /// Primary store, for reads.
    store: Arc<dyn LogStore>,
    /// Search index, for queries.
    search: Arc<dyn SearchIndex>,
    /// Shared pipeline counters.
    metrics: Arc<PipelineMetrics>,
}

impl AppState {
    /// Create a new application state over the given backends.
    pub fn new(
        queues: QueueHandles,
        store: Arc<dyn LogStore>,
        search: Arc<dyn SearchIndex>,
        metrics: Arc<PipelineMetrics>,
        ingest: &IngestConfig,
    ) -> Self {
        let enqueuer = Enqueuer::new(queues.ingest.clone(), metrics.clone(), ingest.max_bulk);
        Self {
            inner: Arc::new(AppStateInner {
                enqueuer,
                queues,
                store,
                search,
                metrics,
            }),
        }
    }

    /// Get the enqueuer.
    pub fn enqueuer(&self) -> &Enqueuer {
        &self.inner.enqueuer
    }

    /// Get the queue handles.
    pub fn queues(&self) -> &QueueHandles {
        &self.inner.queues
    }

    /// Get the primary store.
    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.inner.store
    }

    /// Get the search index.
    pub fn search(&self) -> &Arc<dyn SearchIndex> {
        &self.inner.search
    }

    /// Get the pipeline metrics.
    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.inner.metrics
    }
}
