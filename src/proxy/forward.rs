//! Proxy forwarding handler.
//!
//! # Responsibilities
//! - Forward method, path, query, and body verbatim to the core service
//! - Inject the resolved identity header (single serialization point)
//! - Apply cookie/redirect rewrites to every upstream response
//! - Answer 502 with a diagnostic when the core service is unreachable
//!
//! # Design Decisions
//! - Bodies stream through in both directions; no buffering, so payload
//!   size is unbounded
//! - Any inbound X-User-Id is stripped before injection (spoofing guard)
//! - The Host header is replaced so the core service sees its own origin

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode, Uri},
    response::IntoResponse,
};
use url::Url;

use crate::auth::identity::{Identity, IDENTITY_HEADER};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::rewrite::{rewrite_location, rewrite_set_cookie};

/// Forward a non-auth request to the core service.
pub async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> axum::response::Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let identity = request
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or_else(Identity::anonymous);

    let (mut parts, body) = request.into_parts();

    let uri = match rebase_uri(&parts.uri, &state.core_url) {
        Some(uri) => uri,
        None => {
            tracing::error!(path = %path, "Failed to rebase request URI");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid request URI").into_response();
        }
    };
    parts.uri = uri;

    // Single serialization point for the identity contract. The header
    // name is stored lowercase; the client is configured for HTTP/1
    // title-case, so the core service sees X-User-Id.
    parts.headers.remove(IDENTITY_HEADER);
    parts.headers.insert(
        IDENTITY_HEADER,
        HeaderValue::from_str(&identity.0).unwrap_or_else(|_| HeaderValue::from_static("")),
    );

    // Let the client derive Host from the rebased URI (the core service
    // expects its own origin).
    parts.headers.remove(header::HOST);

    tracing::debug!(
        method = %method,
        path = %path,
        anonymous = identity.is_anonymous(),
        "Forwarding to core service"
    );

    let upstream_request = Request::from_parts(parts, body);
    match state.proxy.request(upstream_request).await {
        Ok(response) => {
            let status = response.status();
            let (mut parts, body) = response.into_parts();
            apply_rewrites(&mut parts.headers, status, &state.core_url, &state.public_url);

            metrics::record_request(&method, status.as_u16(), "core", start);
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(e) => {
            tracing::error!(method = %method, path = %path, error = %e, "Core service unreachable");
            metrics::record_request(&method, 502, "core", start);
            (
                StatusCode::BAD_GATEWAY,
                format!("Proxy error: cannot reach core service: {}", e),
            )
                .into_response()
        }
    }
}

/// Replace the scheme and authority of an inbound URI with the core
/// service target, keeping path and query verbatim.
fn rebase_uri(uri: &Uri, target: &Url) -> Option<Uri> {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .filter(|pq| !pq.is_empty())
        .unwrap_or("/");

    Uri::builder()
        .scheme(target.scheme())
        .authority(target.authority())
        .path_and_query(path_and_query)
        .build()
        .ok()
}

/// Apply the cookie and redirect rewriting rules to an upstream response.
fn apply_rewrites(headers: &mut HeaderMap, status: StatusCode, internal: &Url, public: &Url) {
    let rewritten: Vec<String> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(rewrite_set_cookie)
        .collect();
    if !rewritten.is_empty() {
        headers.remove(header::SET_COOKIE);
        for cookie in rewritten {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.append(header::SET_COOKIE, value);
            }
        }
    }

    if status.is_redirection() {
        let location = headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| rewrite_location(loc, internal, public));
        if let Some(location) = location {
            if let Ok(value) = HeaderValue::from_str(&location) {
                headers.insert(header::LOCATION, value);
            }
        }
    }
}
