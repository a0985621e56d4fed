//! # scribe-search
//!
//! Tenant-scoped search indexing for audit-log entries.
//!
//! The index is a secondary projection of the primary store: losing or
//! lagging it never loses an entry, and the pipeline repairs it through
//! re-index requests. Every query names a tenant and only ever sees that
//! tenant's documents.
//!
//! Two backends:
//!
//! - [`MemorySearchIndex`]: substring matching in process memory
//! - [`HttpSearchIndex`]: an OpenSearch-compatible cluster over HTTP, one
//!   index per tenant

use std::sync::Arc;
use std::time::Duration;

use scribe_core::config::{SearchBackend, SearchConfig};

pub mod error;
pub mod http;
pub mod index;
pub mod memory;

pub use error::SearchError;
pub use http::HttpSearchIndex;
pub use index::SearchIndex;
pub use memory::MemorySearchIndex;

/// Create a search backend from configuration.
pub fn create_search_index(config: &SearchConfig) -> Result<Arc<dyn SearchIndex>, SearchError> {
    match config.backend {
        SearchBackend::Memory => Ok(Arc::new(MemorySearchIndex::new())),
        SearchBackend::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                SearchError::Unavailable("search.endpoint is not configured".to_string())
            })?;
            let index = HttpSearchIndex::new(
                endpoint,
                &config.index_prefix,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(index))
        }
    }
}
