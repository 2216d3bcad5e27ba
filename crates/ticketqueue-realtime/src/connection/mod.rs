//! Connection handling: transport abstraction and the per-connection
//! queue protocol.

pub mod handler;
pub mod memory;
pub mod transport;

pub use handler::{ConnectionHandler, SessionOutcome};
pub use memory::{MemoryClient, MemorySink, MemorySource, memory_pair};
pub use transport::{Deadline, Deadlined, FrameSink, FrameSource};
