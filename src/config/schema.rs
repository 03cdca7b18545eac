//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, public origin).
    pub listener: ListenerConfig,

    /// Upstream service addresses.
    pub upstreams: UpstreamConfig,

    /// Session token settings.
    pub auth: AuthConfig,

    /// Registration saga polling settings.
    pub saga: SagaConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Public origin of the gateway, used to rewrite upstream redirects
    /// and to build resumable status URLs.
    pub public_url: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Upstream service addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// User/identity service base URL (credential store).
    pub user_service_url: String,

    /// Core application service base URL (all non-auth traffic).
    pub core_service_url: String,

    /// Saga orchestrator base URL (registration workflow).
    pub saga_orchestrator_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            user_service_url: "http://localhost:5001".to_string(),
            core_service_url: "http://localhost:5000".to_string(),
            saga_orchestrator_url: "http://localhost:5002".to_string(),
        }
    }
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Symmetric secret for signing session tokens.
    pub signing_secret: String,

    /// Token validity window in seconds.
    pub token_ttl_secs: u64,

    /// Name of the session cookie carrying the token.
    pub cookie_name: String,

    /// Path prefix owned by the auth endpoints; everything else is proxied.
    pub auth_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            signing_secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            cookie_name: "authToken".to_string(),
            auth_prefix: "/auth/".to_string(),
        }
    }
}

/// Registration saga polling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SagaConfig {
    /// Enable saga-backed registration. When disabled, registration
    /// creates the user directly against the user service.
    pub enabled: bool,

    /// Interval between status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before reporting a pending outcome.
    pub max_poll_attempts: u32,
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 1000,
            max_poll_attempts: 30,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds. Must sit above the saga poll
    /// ceiling (poll_interval_ms * max_poll_attempts) or in-flight
    /// registrations get cut off.
    pub request_secs: u64,

    /// Per-call timeout for JSON upstream calls in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
