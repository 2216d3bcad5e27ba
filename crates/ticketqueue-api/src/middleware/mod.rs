//! Tower middleware.

pub mod cors;
