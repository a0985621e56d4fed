//! Consumer worker configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the consumer worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Concurrent workers on the ingest queue.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Concurrent workers on the re-index queue.
    #[serde(default = "default_reindex_workers")]
    pub reindex_workers: usize,

    /// Idle poll interval for the ingest queue, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Idle poll interval for the re-index queue, in milliseconds.
    /// Longer than the ingest interval; re-indexing is lower priority.
    #[serde(default = "default_reindex_poll_interval_ms")]
    pub reindex_poll_interval_ms: u64,

    /// Transient failures up to this attempt release the lease immediately.
    /// Beyond it the worker lets the lease expire, so the visibility
    /// timeout becomes the retry delay.
    #[serde(default = "default_release_threshold")]
    pub release_threshold: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            reindex_workers: default_reindex_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            reindex_poll_interval_ms: default_reindex_poll_interval_ms(),
            release_threshold: default_release_threshold(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_reindex_workers() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_reindex_poll_interval_ms() -> u64 {
    1000
}

fn default_release_threshold() -> u32 {
    2
}
