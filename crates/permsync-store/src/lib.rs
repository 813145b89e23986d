//! permsync-store: Relationship store contract and in-memory backend
//!
//! The external relationship store is an opaque collaborator; this crate
//! pins down the contract the reconciler and verifier depend on
//! ([`RelationshipStore`]) and ships a memory-backed implementation for
//! tests and local runs.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryRelationshipStore;
pub use traits::RelationshipStore;
