//! Gateway error taxonomy.
//!
//! # Design Decisions
//! - One enum covers every failure the auth endpoints can surface;
//!   each variant maps to exactly one HTTP shape
//! - Upstream errors forward the original status and body where possible
//! - Token failures never reach clients on proxy paths (the identity
//!   middleware downgrades to anonymous instead)
//! - Saga timeout is an outcome, not an error, and lives elsewhere

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by the auth endpoints and upstream clients.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required request field is missing or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An upstream returned a non-2xx response; forwarded as-is.
    #[error("upstream returned {status}")]
    Upstream {
        status: StatusCode,
        body: serde_json::Value,
    },

    /// An upstream was unreachable, timed out, or reset the connection.
    #[error("upstream connectivity failure: {0}")]
    Connectivity(String),

    /// A session token failed verification (bad signature, malformed,
    /// or expired). Only surfaced on auth paths.
    #[error("invalid token")]
    InvalidToken,

    /// The saga reached a terminal failure state.
    #[error("saga failed: {error}")]
    SagaFailure {
        error: String,
        compensation_executed: bool,
    },

    /// The saga reported success but the result payload was malformed
    /// (no user object). Distinct from SagaFailure.
    #[error("malformed saga success: {0}")]
    SagaStructural(String),

    /// Unexpected internal failure (e.g., token signing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            GatewayError::Upstream { status, body } => (status, Json(body)).into_response(),
            GatewayError::Connectivity(msg) => {
                tracing::error!(error = %msg, "Upstream connectivity failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            GatewayError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid or expired token" })),
            )
                .into_response(),
            GatewayError::SagaFailure {
                error,
                compensation_executed,
            } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": error,
                    "compensation_executed": compensation_executed,
                })),
            )
                .into_response(),
            GatewayError::SagaStructural(msg) => {
                tracing::error!(error = %msg, "Saga success with malformed payload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("Malformed saga result: {}", msg) })),
                )
                    .into_response()
            }
            GatewayError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl GatewayError {
    /// Classify a reqwest transport error. Non-2xx responses are handled
    /// separately via `Upstream`; everything else is connectivity.
    pub fn from_transport(err: reqwest::Error) -> Self {
        GatewayError::Connectivity(err.to_string())
    }
}
