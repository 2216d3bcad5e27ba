//! Token authenticator trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Validates a bearer credential and extracts the caller's identity.
#[async_trait]
pub trait TokenAuthenticator: Send + Sync + 'static {
    /// Returns the identity carried by `token`, or an `Unauthorized` error.
    async fn authenticate(&self, token: &str) -> AppResult<String>;
}
