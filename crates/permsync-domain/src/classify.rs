//! Descriptor classification.
//!
//! Maps raw caller-supplied descriptors into the store's type vocabulary.
//! Classification never fails: unrecognized inputs default to the more
//! common kind (Document, User).

use crate::types::{
    ObjectDescriptor, ObjectKind, ObjectRef, SubjectDescriptor, SubjectKind, SubjectRef,
    FOLDER_MIME_TYPE,
};

/// Classifies an object descriptor.
///
/// A descriptor whose type string equals the folder MIME signature becomes a
/// [`ObjectKind::Folder`], and its display name is forced to equal its id,
/// matching the store's convention for folder objects. Everything else is a
/// [`ObjectKind::Document`].
pub fn classify_object(descriptor: &ObjectDescriptor) -> ObjectRef {
    if descriptor.object_type == FOLDER_MIME_TYPE {
        ObjectRef::new(&descriptor.object_id, &descriptor.object_id, ObjectKind::Folder)
    } else {
        ObjectRef::new(
            &descriptor.object_id,
            &descriptor.object_name,
            ObjectKind::Document,
        )
    }
}

/// Classifies a subject descriptor.
///
/// Only an explicit "group" subject-type marks a group; anything else,
/// including an absent type, is a user.
pub fn classify_subject(descriptor: &SubjectDescriptor) -> SubjectRef {
    let kind = match descriptor.subject_type.as_deref() {
        Some("group") => SubjectKind::Group,
        _ => SubjectKind::User,
    };
    SubjectRef::new(&descriptor.subject_id, kind)
}
