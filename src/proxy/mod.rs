//! Transparent proxy subsystem.
//!
//! # Data Flow
//! ```text
//! non-auth request (identity already resolved)
//!     → forward.rs (rebase URI, inject identity header, stream body)
//!     → core service
//!     → forward.rs response path
//!     → rewrite.rs (Set-Cookie attributes, redirect Locations)
//!     → client
//! ```

pub mod forward;
pub mod rewrite;

pub use forward::proxy_handler;
