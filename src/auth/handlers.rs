//! Auth endpoint handlers.
//!
//! # Responsibilities
//! - Login: credential validation, token issue, session cookie
//! - Register: saga-backed registration with bounded polling
//! - Register status: client-driven resumption of a pending saga
//!
//! # Design Decisions
//! - Required-field checks happen here (400), before any upstream call
//! - Post-login session migration is spawned best-effort; its failures
//!   are logged and never affect the login response
//! - Saga outcomes map to 201/4xx/202; budget exhaustion is a resumable
//!   202, not an error

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::identity::IDENTITY_HEADER;
use crate::config::AuthConfig;
use crate::error::{GatewayError, Result};
use crate::http::server::AppState;
use crate::saga::SagaPoll;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// `POST /auth/login` — validate credentials, issue a session token.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let (username, password) = match (non_empty(body.username), non_empty(body.password)) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(GatewayError::Validation(
                "Username and password are required".into(),
            ))
        }
    };

    let user = state.users.validate(&username, &password).await?;
    let token = state.tokens.sign(&user)?;

    tracing::info!(user_id = user.id, username = %user.username, "Login succeeded");

    // Best-effort: hand the caller's anonymous core-service session over
    // to the authenticated user. Never blocks or fails the login.
    spawn_session_migration(&state, &headers, user.id);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&state.config.auth, &token))],
        Json(json!({ "token": token })),
    )
        .into_response())
}

/// `POST /auth/register` — drive the registration saga to an HTTP answer.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response> {
    let (username, email, password) = match (
        non_empty(body.username),
        non_empty(body.email),
        non_empty(body.password),
    ) {
        (Some(u), Some(e), Some(p)) => (u, e, p),
        _ => {
            return Err(GatewayError::Validation(
                "Username, email, and password are required".into(),
            ))
        }
    };

    // Direct path when the orchestrator is not in play.
    if !state.config.saga.enabled {
        let user = state.users.create(&username, &email, &password).await?;
        let token = state.tokens.sign(&user)?;
        return Ok((
            StatusCode::CREATED,
            [(header::SET_COOKIE, session_cookie(&state.config.auth, &token))],
            Json(json!({ "token": token, "user": user })),
        )
            .into_response());
    }

    let handle = state.saga.submit(&username, &email, &password).await?;
    tracing::info!(
        saga_id = %handle.saga_id,
        task_id = %handle.task_id,
        "Registration saga submitted"
    );

    match state.saga.wait_for_completion(&handle.task_id).await? {
        SagaPoll::Completed(user) => {
            let token = state.tokens.sign(&user)?;
            tracing::info!(saga_id = %handle.saga_id, user_id = user.id, "Registration completed");
            Ok((
                StatusCode::CREATED,
                [(header::SET_COOKIE, session_cookie(&state.config.auth, &token))],
                Json(json!({
                    "token": token,
                    "user": user,
                    "saga_id": handle.saga_id,
                })),
            )
                .into_response())
        }
        SagaPoll::Failed {
            error,
            compensation_executed,
        } => {
            tracing::warn!(
                saga_id = %handle.saga_id,
                error = %error,
                compensation_executed,
                "Registration saga failed"
            );
            Err(GatewayError::SagaFailure {
                error,
                compensation_executed,
            })
        }
        SagaPoll::Pending => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "saga_id": handle.saga_id,
                "task_id": handle.task_id,
                "status": "pending",
                "status_url": status_url(&state, &handle.task_id),
            })),
        )
            .into_response()),
    }
}

/// `GET /auth/register/status/{task_id}` — one poll, idempotent.
pub async fn register_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response> {
    match state.saga.poll_once(&task_id).await? {
        SagaPoll::Completed(user) => {
            let token = state.tokens.sign(&user)?;
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, session_cookie(&state.config.auth, &token))],
                Json(json!({
                    "status": "completed",
                    "token": token,
                    "user": user,
                })),
            )
                .into_response())
        }
        SagaPoll::Failed {
            error,
            compensation_executed,
        } => Ok(Json(json!({
            "status": "failed",
            "error": error,
            "compensation_executed": compensation_executed,
        }))
        .into_response()),
        SagaPoll::Pending => Ok(Json(json!({
            "status": "pending",
            "task_id": task_id,
        }))
        .into_response()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Session cookie per the browser contract: 24h max age, path /,
/// SameSite=Lax, readable by page scripts (not HttpOnly).
fn session_cookie(auth: &AuthConfig, token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; SameSite=Lax",
        auth.cookie_name, token, auth.token_ttl_secs
    )
}

fn status_url(state: &AppState, task_id: &str) -> String {
    format!(
        "{}/auth/register/status/{}",
        state.config.listener.public_url.trim_end_matches('/'),
        task_id
    )
}

/// Fire-and-forget migration of the caller's anonymous session. The core
/// service reassigns activity recorded under the session cookie to the
/// authenticated user id.
fn spawn_session_migration(state: &AppState, headers: &HeaderMap, user_id: i64) {
    let Some(cookies) = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        // No anonymous session to migrate.
        return;
    };

    let http = state.http.clone();
    let url = format!(
        "{}/api/attempts/migrate",
        state
            .config
            .upstreams
            .core_service_url
            .trim_end_matches('/')
    );

    tokio::spawn(async move {
        let result = http
            .post(url)
            .header(header::COOKIE.as_str(), cookies)
            .header(IDENTITY_HEADER, user_id.to_string())
            .json(&json!({ "user_id": user_id }))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(user_id, "Anonymous session migrated");
            }
            Ok(resp) => {
                tracing::warn!(user_id, status = %resp.status(), "Session migration rejected");
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Session migration failed");
            }
        }
    });
}
