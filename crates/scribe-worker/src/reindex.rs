//! Search index repair.
//!
//! A re-index request names an entry by `(tenant_id, log_id)` only. The
//! worker re-reads the authoritative record from the primary store, so a
//! repair always indexes the stored content, not whatever the envelope
//! carried when indexing first failed.

use async_trait::async_trait;
use scribe_core::ReindexRequest;
use scribe_queue::{Leased, QueueError};

use crate::{QueueWorker, WorkerContext};

/// Processes one leased re-index request at a time.
pub struct ReindexProcessor {
    ctx: WorkerContext,
}

impl ReindexProcessor {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    async fn handle(&self, leased: Leased<ReindexRequest>) -> Result<(), QueueError> {
        let request = &leased.message;

        let entry = match self
            .ctx
            .store
            .get(&request.tenant_id, request.log_id)
            .await
        {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::error!(
                    tenant_id = %request.tenant_id,
                    log_id = %request.log_id,
                    "re-index target missing from primary store"
                );
                let reason = format!(
                    "entry {}:{} not in primary store",
                    request.tenant_id, request.log_id
                );
                self.dead_letter(&leased, reason).await?;
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                self.retry_later(&leased, format!("store: {e}")).await?;
                return Ok(());
            }
            Err(e) => {
                self.dead_letter(&leased, format!("store: {e}")).await?;
                return Ok(());
            }
        };

        match self.ctx.search.index(&entry).await {
            Ok(()) => {
                self.ctx.metrics.record_reindexed();
                tracing::info!(
                    tenant_id = %request.tenant_id,
                    log_id = %request.log_id,
                    "re-index completed"
                );
                self.ctx.queues.reindex.acknowledge(leased.token).await?;
            }
            Err(e) if e.is_transient() => {
                self.retry_later(&leased, format!("index: {e}")).await?;
            }
            Err(e) => {
                tracing::error!(
                    tenant_id = %request.tenant_id,
                    log_id = %request.log_id,
                    error = %e,
                    "permanent index failure, quarantining re-index request"
                );
                self.dead_letter(&leased, format!("index: {e}")).await?;
            }
        }
        Ok(())
    }

    async fn retry_later(
        &self,
        leased: &Leased<ReindexRequest>,
        reason: String,
    ) -> Result<(), QueueError> {
        if leased.delivery_attempt <= self.ctx.config.release_threshold {
            self.ctx
                .queues
                .reindex
                .release(leased.token, Some(reason))
                .await?;
        } else {
            tracing::warn!(
                attempt = leased.delivery_attempt,
                reason = %reason,
                "re-index failure, backing off until lease expiry"
            );
        }
        Ok(())
    }

    async fn dead_letter(
        &self,
        leased: &Leased<ReindexRequest>,
        reason: String,
    ) -> Result<(), QueueError> {
        self.ctx.queues.reindex.dead_letter(leased.token, reason).await?;
        Ok(())
    }
}

#[async_trait]
impl QueueWorker for ReindexProcessor {
    fn kind(&self) -> &'static str {
        "reindex"
    }

    async fn process_next(&self) -> Result<bool, QueueError> {
        let Some(leased) = self.ctx.queues.reindex.lease().await? else {
            return Ok(false);
        };
        self.handle(leased).await?;
        Ok(true)
    }
}
