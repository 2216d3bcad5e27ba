//! JWT token creation with configurable signing and TTL.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use ticketqueue_core::config::AuthConfig;
use ticketqueue_core::error::AppError;

use super::claims::Claims;

/// Creates signed HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Issuer written into every token.
    issuer: String,
    /// Token TTL in minutes.
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("issuer", &self.issuer)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// A freshly minted token and its expiry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedToken {
    /// Encoded token.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            ttl_minutes: config.jwt_ttl_minutes as i64,
        }
    }

    /// Issues a token for `user_id` with the configured TTL.
    pub fn issue(&self, user_id: &str, role: &str) -> Result<IssuedToken, AppError> {
        self.issue_with_ttl(user_id, role, chrono::Duration::minutes(self.ttl_minutes))
    }

    /// Issues a token with an explicit TTL. A negative TTL yields an expired token.
    pub fn issue_with_ttl(
        &self,
        user_id: &str,
        role: &str,
        ttl: chrono::Duration,
    ) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
