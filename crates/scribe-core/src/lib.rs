//! # scribe-core
//!
//! Core types for the Scribe audit-log pipeline.
//!
//! This crate defines the vocabulary shared by every pipeline stage:
//!
//! - [`LogEntry`] / [`LogSubmission`]: the audit record and its
//!   client-supplied precursor
//! - [`Envelope`], [`DeadLetterRecord`], [`ReindexRequest`]: queue message
//!   shapes
//! - [`codec`]: the versioned wire format queue backends serialize with
//! - [`validate_submission`]: explicit field validation with structured
//!   errors
//! - [`PipelineMetrics`]: shared counters behind the stats endpoint
//! - [`ScribeConfig`]: YAML configuration for all stages
//!
//! Everything here is identity- and tenant-centric: `(tenant_id, log_id)`
//! names an entry everywhere, and no API in the downstream crates accepts
//! an entry lookup without a tenant.

pub mod codec;
pub mod config;
pub mod entry;
pub mod envelope;
pub mod metrics;
pub mod validate;

pub use codec::{CodecError, WIRE_VERSION};
pub use config::{
    ConfigError, IngestConfig, QueueBackend, QueueConfig, ScribeConfig, SearchBackend,
    SearchConfig, ServerConfig, StoreBackend, StoreConfig, WorkerConfig,
};
pub use entry::{
    LogAction, LogEntry, LogSeverity, LogSubmission, LogSubmissionBuilder, ParseEnumError,
};
pub use envelope::{DeadLetterRecord, Envelope, FailureRecord, ReindexRequest};
pub use metrics::{PipelineMetrics, PipelineStats};
pub use validate::{FieldError, ValidationError, validate_submission};
