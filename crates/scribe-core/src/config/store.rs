//! Primary store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the primary log store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database URL (for the postgres backend).
    #[serde(default)]
    pub url: Option<String>,

    /// Connection pool size (for the postgres backend).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Primary store backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store. Data does not survive a restart.
    #[default]
    Memory,
    /// Postgres-backed store.
    Postgres,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}
