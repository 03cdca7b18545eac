//! Saga orchestrator wire types and result interpretation.
//!
//! # Responsibilities
//! - Deserialize orchestrator submit/status responses
//! - Interpret loosely-shaped result payloads into one discriminated type
//!
//! # Design Decisions
//! - The orchestrator owns saga state; the gateway only reads it
//! - Exactly three meaningful states: PENDING, SUCCESS, FAILURE; unknown
//!   transient scheduler states are treated as still running
//! - A SUCCESS without a user object is a structural error reported
//!   loudly, never a silent failure
//! - Compensation status is advisory: extracted when present, defaults
//!   to false, never verified

use serde::Deserialize;
use serde_json::Value;

use crate::auth::users::User;
use crate::error::{GatewayError, Result};

/// Identifiers returned by a successful saga submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SagaHandle {
    pub saga_id: String,
    pub task_id: String,
}

/// Orchestrator task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SagaStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
    /// Transient scheduler states (e.g., STARTED, RETRY); still running.
    #[serde(other)]
    Other,
}

/// Raw status-poll response from the orchestrator.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: SagaStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Interpreted outcome of a single status poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SagaPoll {
    /// Terminal success with a well-formed user payload.
    Completed(User),
    /// Terminal failure; compensation flag is advisory.
    Failed {
        error: String,
        compensation_executed: bool,
    },
    /// Not finished yet.
    Pending,
}

impl StatusResponse {
    /// Interpret this response into a discriminated outcome.
    ///
    /// The orchestrator reports business failures two ways: a FAILURE
    /// task status, or a SUCCESS status whose result carries
    /// `success: false`. Both are terminal failures here.
    pub fn interpret(self) -> Result<SagaPoll> {
        match self.status {
            SagaStatus::Pending | SagaStatus::Other => Ok(SagaPoll::Pending),
            SagaStatus::Failure => Ok(SagaPoll::Failed {
                error: self
                    .error
                    .or_else(|| extract_error(self.result.as_ref()))
                    .unwrap_or_else(|| "Registration saga failed".to_string()),
                compensation_executed: compensation_executed(self.result.as_ref()),
            }),
            SagaStatus::Success => {
                let result = self.result.as_ref().and_then(Value::as_object).ok_or_else(
                    || GatewayError::SagaStructural("SUCCESS status with no result object".into()),
                )?;

                if result.get("success").and_then(Value::as_bool) == Some(false) {
                    return Ok(SagaPoll::Failed {
                        error: extract_error(self.result.as_ref())
                            .unwrap_or_else(|| "Registration saga failed".to_string()),
                        compensation_executed: compensation_executed(self.result.as_ref()),
                    });
                }

                // The user object may be nested one level (result.result.user)
                // or flat (result.user).
                let user = result
                    .get("result")
                    .and_then(|inner| inner.get("user"))
                    .or_else(|| result.get("user"))
                    .cloned()
                    .ok_or_else(|| {
                        GatewayError::SagaStructural(
                            "SUCCESS result contains no user object".into(),
                        )
                    })?;

                let user: User = serde_json::from_value(user).map_err(|e| {
                    GatewayError::SagaStructural(format!("user object failed to parse: {}", e))
                })?;

                Ok(SagaPoll::Completed(user))
            }
        }
    }
}

fn extract_error(result: Option<&Value>) -> Option<String> {
    result?
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn compensation_executed(result: Option<&Value>) -> bool {
    result
        .and_then(|r| r.get("compensation"))
        .and_then(|c| c.get("executed"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
