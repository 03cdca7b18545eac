//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route split on /auth)
//!     → auth handlers (login/register/status)
//!       or identity middleware → proxy forwarder
//!     → response back to client
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
