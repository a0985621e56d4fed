//! # scribe-server
//!
//! HTTP ingress for the Scribe audit-log pipeline.
//!
//! Exposes the submission API (single and bulk), tenant-scoped reads over
//! the primary store and search index, and operational endpoints. Handlers
//! never write to the store directly: a submission is validated, wrapped
//! in an envelope and published to the durable queue, and `202 Accepted`
//! is returned once the queue holds it. The consumer workers complete the
//! write asynchronously.
//!
//! Tenant identity comes from the `x-scribe-tenant` header on every data
//! route. A submission whose body names a different tenant is rejected
//! before anything is queued.

pub mod api_types;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod tenant;

pub use error::ServerError;
pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
pub use tenant::TENANT_HEADER;
