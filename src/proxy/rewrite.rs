//! Response rewriting rules for proxied traffic.
//!
//! # Responsibilities
//! - Strip Domain and Secure attributes from upstream Set-Cookie values
//! - Default SameSite=Lax when the upstream sets no SameSite policy
//! - Rewrite absolute redirect Locations pointing at the core service
//!   so they go back through the gateway's public origin
//!
//! # Design Decisions
//! - Both rewrites are idempotent; re-applying is a no-op
//! - Attribute matching is case-insensitive (cookie attributes are)
//! - Relative Locations pass through untouched
//! - localhost and 127.0.0.1 are treated as the same authority

use url::Url;

/// Rewrite one Set-Cookie value so the cookie binds to the gateway origin:
/// drop `Domain`, drop `Secure`, append `SameSite=Lax` if absent.
pub fn rewrite_set_cookie(value: &str) -> String {
    let mut has_same_site = false;

    let mut parts: Vec<&str> = Vec::new();
    for (i, raw) in value.split(';').enumerate() {
        let attr = raw.trim();
        if i == 0 {
            // name=value pair, always kept verbatim.
            parts.push(raw.trim());
            continue;
        }
        let name = attr.split('=').next().unwrap_or("").trim();
        if name.eq_ignore_ascii_case("domain") || name.eq_ignore_ascii_case("secure") {
            continue;
        }
        if name.eq_ignore_ascii_case("samesite") {
            has_same_site = true;
        }
        parts.push(attr);
    }

    let mut rewritten = parts.join("; ");
    if !has_same_site {
        rewritten.push_str("; SameSite=Lax");
    }
    rewritten
}

/// Rewrite an absolute Location header whose authority matches the core
/// service's internal address, pointing it at the gateway's public origin
/// instead. Returns `None` when no rewrite applies (relative location,
/// foreign host, unparseable input).
pub fn rewrite_location(location: &str, internal: &Url, public: &Url) -> Option<String> {
    let target = Url::parse(location).ok()?;

    if !authority_matches(&target, internal) {
        return None;
    }

    let mut rewritten = target;
    rewritten.set_scheme(public.scheme()).ok()?;
    rewritten.set_host(public.host_str()).ok()?;
    rewritten.set_port(public.port()).ok()?;
    Some(rewritten.to_string())
}

/// Compare host and effective port, collapsing loopback aliases. The core
/// service may issue redirects under either localhost or 127.0.0.1.
fn authority_matches(a: &Url, b: &Url) -> bool {
    let host_a = a.host_str().unwrap_or_default();
    let host_b = b.host_str().unwrap_or_default();

    let hosts_match = host_a.eq_ignore_ascii_case(host_b)
        || (is_loopback(host_a) && is_loopback(host_b));

    hosts_match && a.port_or_known_default() == b.port_or_known_default()
}

fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost") || host == "127.0.0.1"
}
