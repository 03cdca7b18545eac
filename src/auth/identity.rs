//! Caller identity resolution.
//!
//! # Responsibilities
//! - Extract a session token from the Authorization header or cookie
//! - Verify it and resolve the caller identity
//! - Downgrade silently to anonymous on any failure
//!
//! # Design Decisions
//! - Applies to every path outside the auth prefix
//! - Never emits an HTTP error; a missing or invalid token means
//!   anonymous access (empty identity), not rejection
//! - The resolved identity travels as a request extension; the proxy
//!   forwarder serializes it to the X-User-Id header exactly once

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::token::TokenService;
use crate::http::server::AppState;

/// Canonical identity header expected by the core service.
pub const IDENTITY_HEADER: &str = "X-User-Id";

/// Resolved caller identity; empty means anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn anonymous() -> Self {
        Identity(String::new())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve identity from request headers: Authorization bearer token
    /// first, session cookie as fallback. Any verification failure
    /// downgrades to anonymous.
    pub fn resolve(headers: &HeaderMap, tokens: &TokenService, cookie_name: &str) -> Self {
        let token = bearer_token(headers).or_else(|| cookie_token(headers, cookie_name));

        match token {
            Some(token) => match tokens.verify(&token) {
                Ok(claims) => Identity(claims.sub),
                Err(_) => {
                    tracing::debug!("Token verification failed, continuing as anonymous");
                    Identity::anonymous()
                }
            },
            None => Identity::anonymous(),
        }
    }
}

/// Extract a bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Extract the named cookie from the Cookie header.
fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name).then(|| value.to_string())
    })
}

/// Middleware attaching the resolved identity to non-auth requests.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Auth endpoints manage tokens themselves.
    if req.uri().path().starts_with(&state.config.auth.auth_prefix) {
        return next.run(req).await;
    }

    let identity = Identity::resolve(
        req.headers(),
        &state.tokens,
        &state.config.auth.cookie_name,
    );
    req.extensions_mut().insert(identity);

    next.run(req).await
}
