//! The validating enqueuer.
//!
//! Accepting a submission means validating it, assigning its identity and
//! publishing an envelope. Nothing here waits on processing; once the
//! publish succeeds the caller gets a receipt and the workers take over.

use std::sync::Arc;

use chrono::Utc;
use scribe_core::{Envelope, LogSubmission, PipelineMetrics, validate_submission};
use scribe_queue::DurableQueue;
use serde::Serialize;
use uuid::Uuid;

use crate::error::IngestError;

/// Receipt returned for an accepted submission.
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueReceipt {
    /// Assigned entry identity.
    pub log_id: Uuid,

    /// Owning tenant.
    pub tenant_id: String,

    /// Deduplication key (`tenant_id:log_id`).
    pub dedup_key: String,
}

/// Validates submissions and publishes envelopes to the ingest queue.
pub struct Enqueuer {
    queue: Arc<dyn DurableQueue<Envelope>>,
    metrics: Arc<PipelineMetrics>,
    max_bulk: usize,
}

/// Entry identity derived from a client retry key.
///
/// The same `(tenant_id, request_id)` pair always maps to the same
/// `log_id`, so a client retrying a submission republishes the same
/// identity and the store collapses the duplicate. Different tenants using
/// the same `request_id` get unrelated IDs.
pub fn derive_log_id(tenant_id: &str, request_id: &str) -> Uuid {
    let tenant_ns = Uuid::new_v5(&Uuid::NAMESPACE_OID, tenant_id.as_bytes());
    Uuid::new_v5(&tenant_ns, request_id.as_bytes())
}

impl Enqueuer {
    pub fn new(
        queue: Arc<dyn DurableQueue<Envelope>>,
        metrics: Arc<PipelineMetrics>,
        max_bulk: usize,
    ) -> Self {
        Self {
            queue,
            metrics,
            max_bulk,
        }
    }

    /// Validate one submission and publish it.
    ///
    /// `authenticated_tenant` comes from the caller's credentials, never
    /// from the submission body; a body naming any other tenant is
    /// rejected.
    pub async fn enqueue(
        &self,
        authenticated_tenant: &str,
        submission: LogSubmission,
    ) -> Result<EnqueueReceipt, IngestError> {
        match self.accept(authenticated_tenant, submission).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                self.metrics.record_rejected(1);
                Err(e)
            }
        }
    }

    /// Validate and publish a batch, reporting per-item outcomes.
    ///
    /// One bad item never blocks its neighbors; the caller gets a result
    /// per submission in input order.
    pub async fn enqueue_bulk(
        &self,
        authenticated_tenant: &str,
        submissions: Vec<LogSubmission>,
    ) -> Result<Vec<Result<EnqueueReceipt, IngestError>>, IngestError> {
        if submissions.len() > self.max_bulk {
            self.metrics.record_rejected(submissions.len() as u64);
            return Err(IngestError::BulkTooLarge {
                max: self.max_bulk,
                got: submissions.len(),
            });
        }

        let mut results = Vec::with_capacity(submissions.len());
        for submission in submissions {
            results.push(self.enqueue(authenticated_tenant, submission).await);
        }
        Ok(results)
    }

    async fn accept(
        &self,
        authenticated_tenant: &str,
        submission: LogSubmission,
    ) -> Result<EnqueueReceipt, IngestError> {
        validate_submission(&submission)?;

        if submission.tenant_id != authenticated_tenant {
            return Err(IngestError::TenantMismatch {
                authenticated: authenticated_tenant.to_string(),
                submitted: submission.tenant_id.clone(),
            });
        }

        let log_id = match &submission.request_id {
            Some(request_id) => derive_log_id(&submission.tenant_id, request_id),
            None => Uuid::new_v4(),
        };

        let entry = submission.into_entry(log_id, Utc::now());
        let receipt = EnqueueReceipt {
            log_id,
            tenant_id: entry.tenant_id.clone(),
            dedup_key: entry.dedup_key(),
        };

        let envelope = Envelope::new(entry);
        self.queue.publish(&envelope).await?;
        self.metrics.record_enqueued(1);

        tracing::debug!(
            tenant_id = %receipt.tenant_id,
            log_id = %receipt.log_id,
            "submission accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::LogAction;
    use scribe_queue::{MemoryQueue, QueueOptions};

    fn enqueuer() -> (Enqueuer, Arc<MemoryQueue<Envelope>>) {
        let queue = Arc::new(MemoryQueue::new(QueueOptions::new("ingest_test")));
        let metrics = Arc::new(PipelineMetrics::new());
        (Enqueuer::new(queue.clone(), metrics, 3), queue)
    }

    fn submission(tenant: &str) -> LogSubmission {
        LogSubmission::builder(
            tenant,
            "user-1",
            LogAction::Create,
            "invoice",
            "inv-1",
            "created invoice",
        )
        .build()
    }

    fn submission_with_request_id(tenant: &str, request_id: &str) -> LogSubmission {
        LogSubmission::builder(
            tenant,
            "user-1",
            LogAction::Create,
            "invoice",
            "inv-1",
            "created invoice",
        )
        .request_id(request_id)
        .build()
    }

    #[tokio::test]
    async fn test_accepted_submission_is_published() {
        let (enqueuer, queue) = enqueuer();
        let receipt = enqueuer
            .enqueue("client_a", submission("client_a"))
            .await
            .unwrap();

        assert_eq!(receipt.tenant_id, "client_a");
        assert_eq!(
            receipt.dedup_key,
            format!("client_a:{}", receipt.log_id)
        );
        assert_eq!(queue.depth().await.unwrap().ready, 1);
    }

    #[tokio::test]
    async fn test_request_id_makes_log_id_deterministic() {
        let (enqueuer, queue) = enqueuer();
        let first = enqueuer
            .enqueue("client_a", submission_with_request_id("client_a", "req-7"))
            .await
            .unwrap();
        let second = enqueuer
            .enqueue("client_a", submission_with_request_id("client_a", "req-7"))
            .await
            .unwrap();

        // A client retry republishes the same identity.
        assert_eq!(first.log_id, second.log_id);
        assert_eq!(queue.depth().await.unwrap().ready, 2);
    }

    #[tokio::test]
    async fn test_same_request_id_different_tenants_differ() {
        let (enqueuer, _queue) = enqueuer();
        let a = enqueuer
            .enqueue("client_a", submission_with_request_id("client_a", "req-7"))
            .await
            .unwrap();
        let b = enqueuer
            .enqueue("client_b", submission_with_request_id("client_b", "req-7"))
            .await
            .unwrap();
        assert_ne!(a.log_id, b.log_id);
    }

    #[tokio::test]
    async fn test_without_request_id_log_ids_are_random() {
        let (enqueuer, _queue) = enqueuer();
        let a = enqueuer
            .enqueue("client_a", submission("client_a"))
            .await
            .unwrap();
        let b = enqueuer
            .enqueue("client_a", submission("client_a"))
            .await
            .unwrap();
        assert_ne!(a.log_id, b.log_id);
    }

    #[tokio::test]
    async fn test_tenant_mismatch_is_rejected() {
        let (enqueuer, queue) = enqueuer();
        let err = enqueuer
            .enqueue("client_a", submission("client_b"))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::TenantMismatch { .. }));
        assert_eq!(queue.depth().await.unwrap().ready, 0);
    }

    #[tokio::test]
    async fn test_invalid_submission_reports_fields() {
        let (enqueuer, queue) = enqueuer();
        let mut bad = submission("client_a");
        bad.user_id = String::new();
        bad.message = String::new();

        let err = enqueuer.enqueue("client_a", bad).await.unwrap_err();
        let IngestError::Validation(validation) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = validation.errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"user_id"));
        assert!(fields.contains(&"message"));
        assert_eq!(queue.depth().await.unwrap().ready, 0);
    }

    #[tokio::test]
    async fn test_bulk_reports_per_item_outcomes() {
        let (enqueuer, queue) = enqueuer();
        let mut bad = submission("client_a");
        bad.resource_id = String::new();

        let results = enqueuer
            .enqueue_bulk(
                "client_a",
                vec![submission("client_a"), bad, submission("client_a")],
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(queue.depth().await.unwrap().ready, 2);
    }

    #[tokio::test]
    async fn test_bulk_over_cap_is_rejected_whole() {
        let (enqueuer, queue) = enqueuer();
        let items = vec![
            submission("client_a"),
            submission("client_a"),
            submission("client_a"),
            submission("client_a"),
        ];

        let err = enqueuer.enqueue_bulk("client_a", items).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::BulkTooLarge { max: 3, got: 4 }
        ));
        assert_eq!(queue.depth().await.unwrap().ready, 0);
    }

    #[test]
    fn test_derive_log_id_is_stable() {
        let a = derive_log_id("client_a", "req-1");
        let b = derive_log_id("client_a", "req-1");
        assert_eq!(a, b);
        assert_ne!(a, derive_log_id("client_a", "req-2"));
    }
}
