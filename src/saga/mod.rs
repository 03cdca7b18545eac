//! Registration saga client subsystem.
//!
//! # Data Flow
//! ```text
//! POST /auth/register
//!     → client.rs submit (orchestrator accepts with saga_id/task_id)
//!     → client.rs poll loop (fixed interval, bounded attempts)
//!     → types.rs interpret (SUCCESS/FAILURE/PENDING → discriminated outcome)
//!     → auth handlers map outcome to HTTP
//! ```
//!
//! The gateway is a read-only observer of saga state: it owns no task
//! record and never retries a saga, it only polls and reports.

pub mod client;
pub mod types;

pub use client::SagaClient;
pub use types::{SagaHandle, SagaPoll, SagaStatus};
