//! Request handlers for the ingress API.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use uuid::Uuid;

use scribe_core::{LogEntry, LogSubmission};
use scribe_ingest::EnqueueReceipt;
use scribe_store::LogFilter;

use crate::api_types::{
    BulkItemResult, BulkSubmitResponse, ListQueryParams, QueueDepths, SearchQueryParams,
    StatsResponse,
};
use crate::error::ServerError;
use crate::state::AppState;
use crate::tenant::require_tenant;

/// Page size when the client does not ask for one.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a client can ask for.
const MAX_PAGE_SIZE: usize = 1000;

/// Handler for submitting a single log entry.
///
/// `202 Accepted` means durably queued, not stored. The receipt carries
/// the assigned `log_id`; clients retrying with the same `request_id` get
/// the same one back.
pub async fn submit_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<LogSubmission>,
) -> Result<(StatusCode, Json<EnqueueReceipt>), ServerError> {
    let tenant = require_tenant(&headers)?;
    let receipt = state.enqueuer().enqueue(&tenant, submission).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

/// Handler for submitting a batch of log entries.
///
/// Entries are validated and queued one by one; the response reports each
/// outcome in submission order. Only an oversized batch is rejected as a
/// whole.
pub async fn submit_bulk(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submissions): Json<Vec<LogSubmission>>,
) -> Result<(StatusCode, Json<BulkSubmitResponse>), ServerError> {
    let tenant = require_tenant(&headers)?;
    let outcomes = state.enqueuer().enqueue_bulk(&tenant, submissions).await?;

    let mut response = BulkSubmitResponse {
        accepted: 0,
        rejected: 0,
        results: Vec::with_capacity(outcomes.len()),
    };
    for outcome in outcomes {
        match outcome {
            Ok(receipt) => {
                response.accepted += 1;
                response.results.push(BulkItemResult::Accepted(receipt));
            }
            Err(e) => {
                response.rejected += 1;
                response.results.push(BulkItemResult::Rejected {
                    error: e.to_string(),
                });
            }
        }
    }

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Handler for listing stored entries, newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<Vec<LogEntry>>, ServerError> {
    let tenant = require_tenant(&headers)?;
    let filter = LogFilter {
        user_id: params.user_id,
        action: params.action,
        resource_type: params.resource_type,
        resource_id: params.resource_id,
        severity: params.severity,
        start_time: params.start_time,
        end_time: params.end_time,
        limit: Some(page_size(params.limit)),
        offset: params.offset,
    };

    let entries = state.store().list(&tenant, filter).await?;
    Ok(Json(entries))
}

/// Handler for fetching one entry by ID.
pub async fn get_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(log_id): Path<Uuid>,
) -> Result<Json<LogEntry>, ServerError> {
    let tenant = require_tenant(&headers)?;
    let entry = state
        .store()
        .get(&tenant, log_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("log entry {log_id}")))?;
    Ok(Json(entry))
}

/// Handler for full-text search over the tenant's entries.
///
/// Search reads the index, which lags the store while re-indexing is in
/// flight. `GET /api/v1/logs` is the authoritative view.
pub async fn search_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<LogEntry>>, ServerError> {
    let tenant = require_tenant(&headers)?;
    let query = params.q.unwrap_or_default();

    let entries = state
        .search()
        .search(&tenant, &query, page_size(params.limit))
        .await?;
    Ok(Json(entries))
}

/// Handler for pipeline statistics.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ServerError> {
    let ingest = state.queues().ingest.depth().await?;
    let reindex = state.queues().reindex.depth().await?;

    Ok(Json(StatsResponse {
        pipeline: state.metrics().snapshot(),
        queues: QueueDepths { ingest, reindex },
    }))
}

/// Handler for health check requests.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "scribe",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn page_size(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
}
