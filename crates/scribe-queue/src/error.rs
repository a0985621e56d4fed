//! Queue error types.

use scribe_core::CodecError;
use thiserror::Error;

/// Errors from queue operations.
///
/// All variants are infrastructure failures from the consumer's point of
/// view: retrying later is always legitimate.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The database backend failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The queue name would produce an invalid table identifier.
    #[error("invalid queue name '{0}'")]
    InvalidName(String),

    /// The queue is in an unusable state.
    #[error("queue unavailable: {0}")]
    Unavailable(String),
}
