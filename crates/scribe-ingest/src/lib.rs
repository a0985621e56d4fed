//! # scribe-ingest
//!
//! The ingress boundary of the Scribe pipeline.
//!
//! The [`Enqueuer`] is the only way a submission becomes a queued
//! envelope. It validates the payload, checks the submission's tenant
//! against the authenticated tenant, assigns the entry identity (derived
//! from `request_id` when the client supplies one) and publishes. It never
//! touches the store or the index; acceptance means "durably queued", not
//! "processed".

pub mod enqueuer;
pub mod error;

pub use enqueuer::{Enqueuer, EnqueueReceipt, derive_log_id};
pub use error::IngestError;
