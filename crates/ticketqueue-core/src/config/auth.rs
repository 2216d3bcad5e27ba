//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer token configuration shared by the WebSocket handshake and the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Token TTL in minutes for tokens minted by the tooling.
    #[serde(default = "default_ttl")]
    pub jwt_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            jwt_ttl_minutes: default_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "ticketqueue".to_string()
}

fn default_ttl() -> u64 {
    120
}
