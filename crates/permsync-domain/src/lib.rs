//! permsync-domain: Core permission domain logic
//!
//! This crate contains the pure, I/O-free building blocks:
//! - Object/subject/role vocabulary shared with the relationship store
//! - Descriptor classification (MIME-like object types, subject-type hints)
//! - Tuple construction for writes, deletes, and the folder parent edge

pub mod classify;
pub mod error;
pub mod tuple;
pub mod types;

// Re-export commonly used types at the crate root
pub use classify::{classify_object, classify_subject};
pub use error::{DomainError, DomainResult};
pub use types::{
    Assignment, ObjectDescriptor, ObjectKind, ObjectRef, RelationTuple, Role, SubjectDescriptor,
    SubjectKind, SubjectRef,
};
