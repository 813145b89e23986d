//! Tuple construction.
//!
//! Pure rendering of store-level triples from domain values. Callers pass
//! the results to the relationship store; nothing here performs I/O.

use crate::types::{Assignment, ObjectKind, ObjectRef, Role, RelationTuple, PARENT_RELATION};

impl Assignment {
    /// Renders this assignment as its store tuple:
    /// `(subject_kind:subject_id, role, object_kind:object_id)`.
    pub fn to_tuple(&self) -> RelationTuple {
        RelationTuple::new(
            self.subject.kind.as_str(),
            &self.subject.id,
            self.role.as_str(),
            self.object.kind.as_str(),
            &self.object.id,
        )
    }
}

/// Builds the structural parent edge linking a folder to a document.
///
/// The shape is fixed regardless of classification: the subject side is
/// always `folder:<id>` and the object side always `doc:<id>`.
pub fn parent_tuple(folder_id: &str, document_id: &str) -> RelationTuple {
    RelationTuple::new(
        ObjectKind::Folder.as_str(),
        folder_id,
        PARENT_RELATION,
        ObjectKind::Document.as_str(),
        document_id,
    )
}

/// Builds the tuple for a user-kind subject holding `role` on `object`.
///
/// Deletions use this so a removal needs only `(object, role, subject_id)`
/// and never a matching desired-state record.
pub fn role_tuple(object: &ObjectRef, role: Role, subject_id: &str) -> RelationTuple {
    RelationTuple::new(
        "user",
        subject_id,
        role.as_str(),
        object.kind.as_str(),
        &object.id,
    )
}
