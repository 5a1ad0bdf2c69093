//! Infrastructure adapters for pending-queue storage.

pub mod queue;
pub use queue::InMemoryJobQueue;
