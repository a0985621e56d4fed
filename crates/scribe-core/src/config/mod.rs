//! Configuration types for the Scribe pipeline.
//!
//! Configuration is loaded from a single YAML file (`scribe.yaml` by
//! convention) into a [`ScribeConfig`] tree. Every section and field has a
//! default, so an empty file configures a fully in-process pipeline
//! (memory queue, memory store, memory search index) suitable for
//! development and tests.

pub mod queue;
pub mod search;
pub mod store;
pub mod worker;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use queue::{QueueBackend, QueueConfig};
pub use search::{SearchBackend, SearchConfig};
pub use store::{StoreBackend, StoreConfig};
pub use worker::WorkerConfig;

/// Complete Scribe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// HTTP ingress settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Submission limits.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Durable queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Primary store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Search index settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Consumer worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// HTTP ingress configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8080`.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Submission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Largest accepted bulk submission.
    #[serde(default = "default_max_bulk")]
    pub max_bulk: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_bulk: default_max_bulk(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_bulk() -> usize {
    100
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScribeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document yields the all-defaults configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Check cross-field requirements the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.backend == QueueBackend::Postgres && self.queue.url.is_none() {
            return Err(ConfigError::Config(
                "queue.url is required when queue.backend is postgres".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Postgres && self.store.url.is_none() {
            return Err(ConfigError::Config(
                "store.url is required when store.backend is postgres".to_string(),
            ));
        }
        if self.search.backend == SearchBackend::Http && self.search.endpoint.is_none() {
            return Err(ConfigError::Config(
                "search.endpoint is required when search.backend is http".to_string(),
            ));
        }
        if self.queue.max_attempts == 0 {
            return Err(ConfigError::Config(
                "queue.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.queue.visibility_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "queue.visibility_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.worker.workers == 0 {
            return Err(ConfigError::Config(
                "worker.workers must be at least 1".to_string(),
            ));
        }
        if self.ingest.max_bulk == 0 {
            return Err(ConfigError::Config(
                "ingest.max_bulk must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
