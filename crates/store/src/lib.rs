//! Persistence collaborator for the InvestFlow investment flow service.
//!
//! The flow service is a stateless request/response handler; concurrency
//! correctness lives here. [`FlowStore`] is the durable-store contract —
//! typed create/read/update per entity plus the aggregate and list queries
//! the service needs — and [`MemoryStore`] is the in-process implementation
//! used for tests and embedding.
//!
//! Three guarantees are part of the trait contract, not optional qualities
//! of an implementation:
//! - eligibility upserts are atomic per (user, offering) key;
//! - escrow balance deltas apply as atomic increments, never
//!   read-modify-write races;
//! - status transitions are check-and-set: the precondition and the write
//!   happen in one critical section.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::FlowStore;
