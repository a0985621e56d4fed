//! Route definitions for the ingress API.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the ingress router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/logs",
            post(handlers::submit_log).get(handlers::list_logs),
        )
        .route("/api/v1/logs/bulk", post(handlers::submit_bulk))
        .route("/api/v1/logs/search", get(handlers::search_logs))
        .route("/api/v1/logs/{log_id}", get(handlers::get_log))
        .route("/api/v1/stats", get(handlers::stats))
        .route("/healthz", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::TENANT_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use scribe_core::{IngestConfig, LogAction, LogSubmission, PipelineMetrics};
    use scribe_queue::{MemoryQueue, QueueHandles, QueueOptions};
    use scribe_search::MemorySearchIndex;
    use scribe_store::MemoryLogStore;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        let queues = QueueHandles {
            ingest: Arc::new(MemoryQueue::new(QueueOptions::new("api_ingest"))),
            reindex: Arc::new(MemoryQueue::new(QueueOptions::new("api_reindex"))),
        };
        AppState::new(
            queues,
            Arc::new(MemoryLogStore::new()),
            Arc::new(MemorySearchIndex::new()),
            Arc::new(PipelineMetrics::new()),
            &IngestConfig::default(),
        )
    }

    fn submission_json(tenant: &str) -> serde_json::Value {
        json!({
            "tenant_id": tenant,
            "user_id": "user-1",
            "action": "CREATE",
            "resource_type": "invoice",
            "resource_id": "inv-1",
            "message": "created invoice",
        })
    }

    fn post_request(uri: &str, tenant: Option<&str>, body: &serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(tenant) = tenant {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, tenant: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(TENANT_HEADER, tenant)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// The health endpoint answers without a tenant header.
    #[tokio::test]
    async fn test_health_endpoint() {
        let state = test_state();
        let (status, body) = send(
            create_router(state),
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    /// A valid submission is queued and answered with a receipt.
    #[tokio::test]
    async fn test_submit_returns_receipt_and_queues() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, body) = send(
            app,
            post_request("/api/v1/logs", Some("client_a"), &submission_json("client_a")),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let log_id = Uuid::parse_str(body["log_id"].as_str().unwrap()).unwrap();
        assert_eq!(body["dedup_key"], format!("client_a:{log_id}"));
        assert_eq!(state.queues().ingest.depth().await.unwrap().ready, 1);
    }

    /// Without a tenant header the submission never reaches the queue.
    #[tokio::test]
    async fn test_submit_without_tenant_header_unauthorized() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, _) = send(
            app,
            post_request("/api/v1/logs", None, &submission_json("client_a")),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.queues().ingest.depth().await.unwrap().ready, 0);
    }

    /// A body naming another tenant is rejected with 403.
    #[tokio::test]
    async fn test_submit_tenant_mismatch_forbidden() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, body) = send(
            app,
            post_request("/api/v1/logs", Some("client_b"), &submission_json("client_a")),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("tenant mismatch"));
        assert_eq!(state.queues().ingest.depth().await.unwrap().ready, 0);
    }

    /// Field validation failures come back as structured errors.
    #[tokio::test]
    async fn test_submit_invalid_fields_unprocessable() {
        let state = test_state();
        let app = create_router(state);

        let mut body = submission_json("client_a");
        body["user_id"] = json!("");
        body["message"] = json!("");

        let (status, response) = send(app, post_request("/api/v1/logs", Some("client_a"), &body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = response["fields"].as_array().unwrap();
        assert!(fields.iter().any(|f| f["field"] == "user_id"));
        assert!(fields.iter().any(|f| f["field"] == "message"));
    }

    /// Bulk submissions report accept and reject per item, in order.
    #[tokio::test]
    async fn test_bulk_reports_each_outcome() {
        let state = test_state();
        let app = create_router(state.clone());

        let mut bad = submission_json("client_a");
        bad["user_id"] = json!("");
        let batch = json!([
            submission_json("client_a"),
            bad,
            submission_json("client_a"),
        ]);

        let (status, body) = send(
            app,
            post_request("/api/v1/logs/bulk", Some("client_a"), &batch),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["rejected"], 1);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["status"], "accepted");
        assert_eq!(results[1]["status"], "rejected");
        assert_eq!(results[2]["status"], "accepted");
        assert_eq!(state.queues().ingest.depth().await.unwrap().ready, 2);
    }

    /// Fetching an unknown entry is a 404.
    #[tokio::test]
    async fn test_get_log_not_found() {
        let state = test_state();
        let app = create_router(state);

        let uri = format!("/api/v1/logs/{}", Uuid::new_v4());
        let (status, _) = send(app, get_request(&uri, "client_a")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    /// Listing only ever returns the requesting tenant's entries.
    #[tokio::test]
    async fn test_list_logs_scoped_to_tenant() {
        let state = test_state();

        for tenant in ["client_a", "client_b"] {
            let entry = LogSubmission::builder(
                tenant,
                "user-1",
                LogAction::Create,
                "invoice",
                "inv-1",
                "created invoice",
            )
            .build()
            .into_entry(Uuid::new_v4(), Utc::now());
            state.store().upsert(&entry).await.unwrap();
        }

        let app = create_router(state.clone());
        let (status, body) = send(app, get_request("/api/v1/logs", "client_a")).await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["tenant_id"], "client_a");

        let uri = format!("/api/v1/logs/{}", entries[0]["log_id"].as_str().unwrap());
        let (status, _) = send(create_router(state), get_request(&uri, "client_a")).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Search serves from the index, scoped to the tenant.
    #[tokio::test]
    async fn test_search_returns_indexed_entries() {
        let state = test_state();

        let entry = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Update,
            "invoice",
            "inv-2",
            "updated invoice total",
        )
        .build()
        .into_entry(Uuid::new_v4(), Utc::now());
        state.search().index(&entry).await.unwrap();

        let app = create_router(state);
        let (status, body) = send(app, get_request("/api/v1/logs/search?q=total", "client_a")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    /// Stats expose pipeline counters and queue depths.
    #[tokio::test]
    async fn test_stats_reports_depth_and_counters() {
        let state = test_state();
        let app = create_router(state.clone());

        let (status, _) = send(
            app,
            post_request("/api/v1/logs", Some("client_a"), &submission_json("client_a")),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = send(
            create_router(state),
            Request::builder()
                .uri("/api/v1/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pipeline"]["enqueued"], 1);
        assert_eq!(body["queues"]["ingest"]["ready"], 1);
        assert_eq!(body["queues"]["reindex"]["ready"], 0);
    }
}
