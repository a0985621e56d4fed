//! Search index configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the search index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search backend type.
    #[serde(default)]
    pub backend: SearchBackend,

    /// Base URL of the search cluster (for the http backend),
    /// e.g. `http://localhost:9200`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Index name prefix. Each tenant gets its own index named
    /// `<prefix>-<tenant_id>`.
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Request timeout in seconds (for the http backend).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Search backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// In-process substring index.
    #[default]
    Memory,
    /// OpenSearch-compatible HTTP API.
    Http,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackend::default(),
            endpoint: None,
            index_prefix: default_index_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_index_prefix() -> String {
    "scribe-logs".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
