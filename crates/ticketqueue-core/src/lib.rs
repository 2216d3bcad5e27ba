//! # ticketqueue-core
//!
//! Core crate for TicketQueue. Contains configuration schemas, typed
//! identifiers, the collaborator traits the admission engine consumes
//! (inventory and token authentication), and the unified error system.
//!
//! This crate has **no** internal dependencies on other TicketQueue crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
