//! Durable queue configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the durable queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue backend type.
    #[serde(default)]
    pub backend: QueueBackend,

    /// Database URL (for the postgres backend).
    #[serde(default)]
    pub url: Option<String>,

    /// Table name prefix (for the postgres backend). The ingest queue uses
    /// `<prefix>_ingest_*` tables and the re-index queue `<prefix>_reindex_*`.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// How long a lease lasts before the message becomes leasable again.
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Deliveries before an envelope is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Deliveries before a re-index request is dead-lettered.
    #[serde(default = "default_reindex_max_attempts")]
    pub reindex_max_attempts: u32,
}

/// Queue backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// In-process queue. Workers must run inside the same process.
    #[default]
    Memory,
    /// Postgres-backed queue shared between processes.
    Postgres,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            url: None,
            table_prefix: default_table_prefix(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            max_attempts: default_max_attempts(),
            reindex_max_attempts: default_reindex_max_attempts(),
        }
    }
}

fn default_table_prefix() -> String {
    "scribe".to_string()
}

fn default_visibility_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_reindex_max_attempts() -> u32 {
    3
}
