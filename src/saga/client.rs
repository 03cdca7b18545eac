//! Saga orchestrator client.
//!
//! # Responsibilities
//! - Submit registration sagas to the orchestrator
//! - Poll task status at a fixed interval with a bounded attempt budget
//! - Answer one-shot status queries for client-driven resumption
//!
//! # Design Decisions
//! - Submit succeeds only on HTTP 202 with {saga_id, task_id}; anything
//!   else is an immediate UpstreamError carrying the orchestrator's body
//! - The poll loop runs inside the request handler future, so a client
//!   disconnect cancels it; the saga continues server-side regardless
//! - The gateway retains no task state; exhaustion returns Pending and
//!   resumption happens via the status endpoint

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use crate::config::SagaConfig;
use crate::error::{GatewayError, Result};
use crate::saga::types::{SagaHandle, SagaPoll, StatusResponse};

/// HTTP client for the saga orchestrator.
#[derive(Clone)]
pub struct SagaClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl SagaClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, config: &SagaConfig) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts,
        }
    }

    /// Submit a registration saga. Success contract is HTTP 202.
    pub async fn submit(&self, username: &str, email: &str, password: &str) -> Result<SagaHandle> {
        let response = self
            .http
            .post(format!("{}/saga/register", self.base_url))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

        if status != StatusCode::ACCEPTED {
            let body = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or_else(|_| json!({ "error": "Failed to start registration saga" }));
            return Err(GatewayError::Upstream { status, body });
        }

        response
            .json::<SagaHandle>()
            .await
            .map_err(|e| GatewayError::Connectivity(format!("malformed saga handle: {}", e)))
    }

    /// Perform a single status poll and interpret the result.
    pub async fn poll_once(&self, task_id: &str) -> Result<SagaPoll> {
        let response = self
            .http
            .get(format!("{}/saga/status/{}", self.base_url, task_id))
            .send()
            .await
            .map_err(GatewayError::from_transport)?;

        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

        if !status.is_success() {
            let body = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or_else(|_| json!({ "error": "Failed to get saga status" }));
            return Err(GatewayError::Upstream { status, body });
        }

        let parsed = response
            .json::<StatusResponse>()
            .await
            .map_err(|e| GatewayError::Connectivity(format!("malformed saga status: {}", e)))?;

        parsed.interpret()
    }

    /// Poll until a terminal state or the attempt budget runs out.
    ///
    /// Returns `Pending` when the budget is exhausted; the caller maps
    /// that to a resumable 202, not an error. Dropping the future (client
    /// disconnect) stops polling immediately.
    pub async fn wait_for_completion(&self, task_id: &str) -> Result<SagaPoll> {
        for attempt in 1..=self.max_poll_attempts {
            match self.poll_once(task_id).await? {
                SagaPoll::Pending => {
                    tracing::debug!(
                        task_id = %task_id,
                        attempt,
                        max_attempts = self.max_poll_attempts,
                        "Saga still pending"
                    );
                    if attempt < self.max_poll_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
                terminal => return Ok(terminal),
            }
        }

        tracing::info!(task_id = %task_id, "Saga poll budget exhausted, reporting pending");
        Ok(SagaPoll::Pending)
    }
}
