//! Ingress error types.

use scribe_core::ValidationError;
use scribe_queue::QueueError;

/// Errors returned when accepting a submission.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The submission failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The submission names a tenant other than the authenticated one.
    #[error("tenant mismatch: authenticated as '{authenticated}', submission names '{submitted}'")]
    TenantMismatch {
        authenticated: String,
        submitted: String,
    },

    /// The submission could not be published to the durable queue.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// A bulk request carried more items than the configured cap.
    #[error("bulk submission exceeds {max} items: got {got}")]
    BulkTooLarge { max: usize, got: usize },
}
