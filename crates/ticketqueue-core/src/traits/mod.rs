//! Collaborator traits consumed by the admission engine.

pub mod authenticator;
pub mod inventory;

pub use authenticator::TokenAuthenticator;
pub use inventory::{InventorySource, PoolSnapshot};
