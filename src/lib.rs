//! Edge gateway library.
//!
//! Unifies three backend collaborators behind one public origin:
//! a user/identity service (credentials), a core application service
//! (all non-auth traffic, transparently proxied), and a saga
//! orchestrator (asynchronous registration workflow).

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;

// Domain
pub mod auth;
pub mod saga;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
