//! Search error types.

/// Errors returned by [`SearchIndex`](crate::SearchIndex) backends.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The index rejected the document. Retrying the same document cannot
    /// succeed.
    #[error("index rejected request: {0}")]
    Rejected(String),

    /// The index is unreachable or failing. Retry later.
    #[error("index unavailable: {0}")]
    Unavailable(String),

    /// The HTTP transport failed before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A document or response could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SearchError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Transport(_))
    }
}
