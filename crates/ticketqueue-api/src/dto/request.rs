//! Request DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/queue/{tier}/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// Variant the caller paid for; must match the session's merch selection.
    pub with_merch: bool,
}
