//! HTTP search backend for OpenSearch-compatible clusters.
//!
//! Each tenant gets its own index named `<prefix>-<tenant>`, and documents
//! are addressed by `log_id` so re-indexing replaces rather than duplicates.
//! Because index names are a sanitized rendering of the tenant ID, search
//! results are additionally filtered by the entry's own `tenant_id` field
//! before they leave this module.

use std::time::Duration;

use async_trait::async_trait;
use scribe_core::LogEntry;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::SearchError;
use crate::index::SearchIndex;

/// Search backend speaking the OpenSearch document and query APIs.
pub struct HttpSearchIndex {
    client: reqwest::Client,
    endpoint: String,
    index_prefix: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: LogEntry,
}

async fn classify(resp: reqwest::Response) -> Result<reqwest::Response, SearchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body: String = resp
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(256)
        .collect();
    if status.is_client_error() {
        Err(SearchError::Rejected(format!("{status}: {body}")))
    } else {
        Err(SearchError::Unavailable(format!("{status}: {body}")))
    }
}

impl HttpSearchIndex {
    /// Create a backend against `endpoint` (e.g. `http://localhost:9200`).
    pub fn new(
        endpoint: impl Into<String>,
        index_prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            index_prefix: index_prefix.into(),
        })
    }

    /// Index name for one tenant, folded into the cluster's naming rules.
    fn index_name(&self, tenant_id: &str) -> String {
        let tenant: String = tenant_id
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        format!("{}-{}", self.index_prefix, tenant)
    }

    fn doc_url(&self, tenant_id: &str, log_id: Uuid) -> String {
        format!(
            "{}/{}/_doc/{}",
            self.endpoint,
            self.index_name(tenant_id),
            log_id
        )
    }

    fn search_body(query: &str, limit: usize) -> serde_json::Value {
        let clause = if query.trim().is_empty() {
            serde_json::json!({ "match_all": {} })
        } else {
            serde_json::json!({
                "multi_match": {
                    "query": query,
                    "fields": ["message", "resource_type", "resource_id", "user_id"],
                }
            })
        };
        serde_json::json!({
            "size": limit,
            "sort": [{ "timestamp": { "order": "desc", "unmapped_type": "date" } }],
            "query": clause,
        })
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn index(&self, entry: &LogEntry) -> Result<(), SearchError> {
        let url = self.doc_url(&entry.tenant_id, entry.log_id);
        tracing::debug!(url = %url, "indexing document");
        let resp = self.client.put(&url).json(entry).send().await?;
        classify(resp).await?;
        Ok(())
    }

    async fn search(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LogEntry>, SearchError> {
        let url = format!("{}/{}/_search", self.endpoint, self.index_name(tenant_id));
        let resp = self
            .client
            .post(&url)
            .json(&Self::search_body(query, limit))
            .send()
            .await?;

        // A tenant with no indexed documents has no index yet.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let resp = classify(resp).await?;

        let parsed: SearchResponse = resp.json().await?;
        let mut entries: Vec<LogEntry> = parsed.hits.hits.into_iter().map(|h| h.source).collect();
        entries.retain(|e| e.tenant_id == tenant_id);
        Ok(entries)
    }
}
