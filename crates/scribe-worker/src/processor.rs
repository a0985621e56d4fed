//! Ingest envelope processing.
//!
//! The settlement protocol runs store-first: an envelope is only
//! acknowledged once its entry is durable in the primary store and search
//! repair (when needed) is scheduled on the re-index queue. Nothing that
//! happens to the search index can un-store an entry.

use async_trait::async_trait;
use scribe_core::{Envelope, ReindexRequest};
use scribe_queue::{Leased, QueueError};
use scribe_store::{StoreError, UpsertOutcome};

use crate::{QueueWorker, WorkerContext};

/// Processes one leased envelope at a time.
pub struct Processor {
    ctx: WorkerContext,
}

impl Processor {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn handle(&self, leased: Leased<Envelope>) -> Result<(), QueueError> {
        let dedup_key = leased.message.dedup_key.clone();
        let entry = &leased.message.entry;

        // Durability first.
        match self.ctx.store.upsert(entry).await {
            Ok(UpsertOutcome::Inserted) => self.ctx.metrics.record_stored(),
            Ok(UpsertOutcome::AlreadyPresent) => {
                self.ctx.metrics.record_duplicate();
                tracing::debug!(dedup_key = %dedup_key, "duplicate delivery collapsed");
            }
            Err(StoreError::Conflict { .. }) => {
                self.ctx.metrics.record_conflict();
                tracing::error!(
                    dedup_key = %dedup_key,
                    "integrity conflict, dead-lettering delivery"
                );
                let reason = format!("integrity conflict: stored entry differs for {dedup_key}");
                self.dead_letter(&leased, reason).await?;
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                self.retry_later(&leased, format!("store: {e}")).await?;
                return Ok(());
            }
            Err(e) => {
                tracing::error!(
                    dedup_key = %dedup_key,
                    error = %e,
                    "permanent store failure, dead-lettering delivery"
                );
                self.dead_letter(&leased, format!("store: {e}")).await?;
                return Ok(());
            }
        }

        // Index, without ever holding durability hostage: a failed write
        // becomes a re-index request and the envelope still settles.
        match self.ctx.search.index(entry).await {
            Ok(()) => self.ctx.metrics.record_indexed(),
            Err(e) => {
                self.ctx.metrics.record_index_failure();
                tracing::warn!(
                    dedup_key = %dedup_key,
                    error = %e,
                    "index write failed, scheduling re-index"
                );
                let request = ReindexRequest::new(&entry.tenant_id, entry.log_id);
                if let Err(publish_err) = self.ctx.queues.reindex.publish(&request).await {
                    // Without a scheduled repair the envelope must come
                    // back; the store collapses the redelivery as a
                    // duplicate.
                    self.retry_later(&leased, format!("re-index publish: {publish_err}"))
                        .await?;
                    return Ok(());
                }
                self.ctx.metrics.record_reindex_scheduled();
            }
        }

        if self.ctx.queues.ingest.acknowledge(leased.token).await? {
            self.ctx.metrics.record_ack();
        } else {
            tracing::debug!(
                dedup_key = %dedup_key,
                "lease lapsed before acknowledge; redelivery will collapse"
            );
        }
        Ok(())
    }

    /// Settle a transient failure into one of the two retry tiers.
    async fn retry_later(
        &self,
        leased: &Leased<Envelope>,
        reason: String,
    ) -> Result<(), QueueError> {
        if leased.delivery_attempt <= self.ctx.config.release_threshold {
            tracing::warn!(
                attempt = leased.delivery_attempt,
                reason = %reason,
                "transient failure, releasing for quick retry"
            );
            if self
                .ctx
                .queues
                .ingest
                .release(leased.token, Some(reason))
                .await?
            {
                self.ctx.metrics.record_release();
            }
        } else {
            // The lease runs out on its own; the visibility timeout is the
            // backoff delay.
            tracing::warn!(
                attempt = leased.delivery_attempt,
                reason = %reason,
                "transient failure, backing off until lease expiry"
            );
        }
        Ok(())
    }

    async fn dead_letter(
        &self,
        leased: &Leased<Envelope>,
        reason: String,
    ) -> Result<(), QueueError> {
        if self.ctx.queues.ingest.dead_letter(leased.token, reason).await? {
            self.ctx.metrics.record_dead_letter();
        }
        Ok(())
    }
}

#[async_trait]
impl QueueWorker for Processor {
    fn kind(&self) -> &'static str {
        "ingest"
    }

    async fn process_next(&self) -> Result<bool, QueueError> {
        let Some(leased) = self.ctx.queues.ingest.lease().await? else {
            return Ok(false);
        };
        self.ctx.metrics.record_lease();
        self.handle(leased).await?;
        Ok(true)
    }
}
