//! `AuthUser` extractor: validates the bearer token on HTTP requests.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use ticketqueue_auth::Claims;
use ticketqueue_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Caller identity taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Identity used for queue lookups.
    pub fn identity(&self) -> &str {
        &self.0.user_id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwt_decoder.decode(token)?;
        Ok(AuthUser(claims))
    }
}
