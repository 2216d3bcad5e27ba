//! Convenience result type alias for TicketQueue.

use crate::error::AppError;

/// A specialized `Result` type for TicketQueue operations.
pub type AppResult<T> = Result<T, AppError>;
