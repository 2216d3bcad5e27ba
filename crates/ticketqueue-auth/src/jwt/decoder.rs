//! JWT token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use ticketqueue_core::config::AuthConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::TokenAuthenticator;

use super::claims::Claims;

/// Validates HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // seconds of clock skew
        validation.set_issuer(&[config.jwt_issuer.as_str()]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::unauthorized("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthorized("Invalid token signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::unauthorized("Invalid token issuer")
                    }
                    _ => AppError::unauthorized(format!("Token validation failed: {e}")),
                }
            })?;

        if token_data.claims.user_id.is_empty() {
            return Err(AppError::unauthorized("Token carries no user id"));
        }

        Ok(token_data.claims)
    }
}

#[async_trait]
impl TokenAuthenticator for JwtDecoder {
    async fn authenticate(&self, token: &str) -> AppResult<String> {
        let claims = self.decode(token)?;
        tracing::debug!(user_id = %claims.user_id, "Bearer token accepted");
        Ok(claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use ticketqueue_core::error::ErrorKind;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_issuer: "ticketqueue-test".to_string(),
            jwt_ttl_minutes: 5,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_identity() {
        let config = config("secret");
        let issued = JwtEncoder::new(&config).issue("user-1", "user").unwrap();
        let identity = JwtDecoder::new(&config)
            .authenticate(&issued.token)
            .await
            .unwrap();
        assert_eq!(identity, "user-1");
    }

    #[tokio::test]
    async fn test_rejects_wrong_secret() {
        let issued = JwtEncoder::new(&config("one")).issue("user-1", "user").unwrap();
        let err = JwtDecoder::new(&config("two"))
            .authenticate(&issued.token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_rejects_expired() {
        let config = config("secret");
        let issued = JwtEncoder::new(&config)
            .issue_with_ttl("user-1", "user", chrono::Duration::minutes(-10))
            .unwrap();
        let err = JwtDecoder::new(&config).decode(&issued.token).unwrap_err();
        assert_eq!(err.message, "Token has expired");
    }

    #[tokio::test]
    async fn test_rejects_foreign_issuer() {
        let mut other = config("secret");
        other.jwt_issuer = "someone-else".to_string();
        let issued = JwtEncoder::new(&other).issue("user-1", "user").unwrap();
        assert!(JwtDecoder::new(&config("secret")).decode(&issued.token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(JwtDecoder::new(&config("secret")).decode("not.a.token").is_err());
    }
}
