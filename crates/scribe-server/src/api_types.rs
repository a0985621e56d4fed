//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scribe_core::{FieldError, LogAction, LogSeverity, PipelineStats};
use scribe_ingest::EnqueueReceipt;
use scribe_queue::QueueDepth;

// =============================================================================
// Submission Types
// =============================================================================

/// Per-batch outcome of a bulk submission.
///
/// A batch is accepted item by item: one invalid entry never rejects its
/// neighbours. `results` preserves submission order.
#[derive(Debug, Serialize)]
pub struct BulkSubmitResponse {
    pub accepted: usize,
    pub rejected: usize,
    pub results: Vec<BulkItemResult>,
}

/// Outcome of a single entry within a bulk submission.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkItemResult {
    Accepted(EnqueueReceipt),
    Rejected { error: String },
}

// =============================================================================
// Read Types
// =============================================================================

/// Query parameters for listing stored entries.
#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    pub user_id: Option<String>,
    pub action: Option<LogAction>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub severity: Option<LogSeverity>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Query parameters for full-text search.
#[derive(Debug, Deserialize)]
pub struct SearchQueryParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

// =============================================================================
// Operational Types
// =============================================================================

/// Pipeline counters and queue depths.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub pipeline: PipelineStats,
    pub queues: QueueDepths,
}

/// Depth of both pipeline queues.
#[derive(Debug, Serialize)]
pub struct QueueDepths {
    pub ingest: QueueDepth,
    pub reindex: QueueDepth,
}

/// Generic error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}
