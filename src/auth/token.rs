//! Session token signing and verification.
//!
//! # Responsibilities
//! - Sign HS256 session tokens carrying identity claims
//! - Verify tokens presented via header or cookie
//!
//! # Design Decisions
//! - Symmetric secret configured at startup; keys derived once
//! - Fixed validity window (24h by default), always embedded
//! - Strict leeway (5 seconds) so tokens expire promptly while
//!   tolerating minor clock skew
//! - Verification failure is a single opaque InvalidToken; callers
//!   decide whether to reject or downgrade to anonymous

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::users::User;
use crate::config::AuthConfig;
use crate::error::{GatewayError, Result};

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID as a string).
    pub sub: String,
    /// User ID.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Username.
    pub username: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Signs and verifies session tokens under the gateway's secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            ttl: Duration::seconds(config.token_ttl_secs as i64),
        }
    }

    /// Sign a session token for a validated user.
    pub fn sign(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            user_id: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| GatewayError::Internal(format!("token signing failed: {}", e)))
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with `InvalidToken` when the signature does not match, the
    /// token is malformed, or it is expired.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| GatewayError::InvalidToken)
    }
}
