//! # ticketqueue-inventory
//!
//! [`InventorySource`](ticketqueue_core::traits::InventorySource)
//! implementations consumed by the admission hubs:
//!
//! - `memory`: pools held in a concurrent map, seeded from configuration
//! - `postgres`: pools read from the `events` table
//! - `cached`: short-lived read cache in front of any source
//! - `bounded`: hard upper bound on the latency of a single read
//!
//! [`InventoryManager`] assembles the configured stack.

pub mod bounded;
pub mod cached;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod provider;

pub use bounded::BoundedInventory;
pub use cached::CachedInventory;
pub use memory::MemoryInventory;
pub use provider::InventoryManager;
