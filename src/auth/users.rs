//! User service client.
//!
//! # Responsibilities
//! - Validate credentials against the user service
//! - Create users directly when saga registration is disabled
//!
//! # Design Decisions
//! - Non-2xx responses forward the upstream status and body verbatim
//! - Transport failures map to Connectivity (500), never hang
//! - Buffered JSON exchanges; streaming is only for the proxy path

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{GatewayError, Result};

/// A user record as returned by the user service (and by the saga result).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// HTTP client for the user/identity service.
#[derive(Clone)]
pub struct UserServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserServiceClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Validate credentials. Returns the user on 200; forwards any other
    /// upstream status as `Upstream`.
    pub async fn validate(&self, username: &str, password: &str) -> Result<User> {
        let response = self
            .http
            .post(format!("{}/users/validate", self.base_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        Self::expect_user(response, StatusCode::OK, "Invalid credentials").await
    }

    /// Create a user directly (non-saga registration path).
    pub async fn create(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let response = self
            .http
            .post(format!("{}/users", self.base_url))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        Self::expect_user(response, StatusCode::CREATED, "Registration failed").await
    }

    async fn expect_user(
        response: reqwest::Response,
        expected: StatusCode,
        fallback_error: &str,
    ) -> Result<User> {
        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

        if status == expected {
            response
                .json::<User>()
                .await
                .map_err(|e| GatewayError::Connectivity(format!("malformed user payload: {}", e)))
        } else {
            let body = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or_else(|_| json!({ "error": fallback_error }));
            Err(GatewayError::Upstream { status, body })
        }
    }
}
