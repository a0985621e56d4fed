//! Error types for the ingress API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use scribe_ingest::IngestError;
use scribe_queue::QueueError;
use scribe_search::SearchError;
use scribe_store::StoreError;

use crate::api_types::ErrorResponse;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to start the server.
    #[error("failed to start ingress server: {0}")]
    Startup(String),

    /// The tenant header is missing or unusable.
    #[error("missing or invalid x-scribe-tenant header")]
    MissingTenant,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Submission was rejected or could not be queued.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Queue introspection failed.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Primary store read failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Search query failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::MissingTenant => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Ingest(IngestError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Ingest(IngestError::TenantMismatch { .. }) => StatusCode::FORBIDDEN,
            ServerError::Ingest(IngestError::BulkTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Ingest(IngestError::Queue(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Store(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Search(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        let fields = match &self {
            ServerError::Ingest(IngestError::Validation(e)) => Some(e.errors.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.to_string(),
            fields,
        };

        (status, Json(body)).into_response()
    }
}
