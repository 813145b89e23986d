//! Core type definitions shared with the relationship store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// MIME signature that marks an object descriptor as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Relation name for the structural folder -> document edge.
///
/// Not a role: it carries hierarchy, not a grant.
pub const PARENT_RELATION: &str = "parent";

/// Kind of an object in the store's type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Document,
    Folder,
}

impl ObjectKind {
    /// The store-level type name ("doc" or "folder").
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Document => "doc",
            ObjectKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a subject in the store's type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
}

impl SubjectKind {
    /// The store-level type name ("user" or "group").
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::User => "user",
            SubjectKind::Group => "group",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grantable role on an object.
///
/// The set is fixed and ordered; reconciliation walks roles in
/// [`Role::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Writer,
    Viewer,
}

impl Role {
    /// All roles in fixed reconciliation order.
    pub const ALL: [Role; 3] = [Role::Owner, Role::Writer, Role::Viewer];

    /// The store-level relation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Writer => "writer",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> DomainResult<Self> {
        match value {
            "owner" => Ok(Role::Owner),
            "writer" => Ok(Role::Writer),
            "viewer" => Ok(Role::Viewer),
            other => Err(DomainError::UnknownRole {
                value: other.to_string(),
            }),
        }
    }
}

/// A classified object.
///
/// Invariant: for [`ObjectKind::Folder`] the display name equals the id,
/// matching the store's convention for folder objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
}

impl ObjectRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }

    /// The store key, "kind:id".
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

/// A classified subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectRef {
    pub id: String,
    pub kind: SubjectKind,
}

impl SubjectRef {
    pub fn new(id: impl Into<String>, kind: SubjectKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// The store key, "kind:id".
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

/// The desired-state unit a caller submits: subject holds role on object.
///
/// Assignments exist only transiently in request payloads; only tuples are
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub subject: SubjectRef,
    pub role: Role,
    pub object: ObjectRef,
}

impl Assignment {
    pub fn new(subject: SubjectRef, role: Role, object: ObjectRef) -> Self {
        Self {
            subject,
            role,
            object,
        }
    }
}

/// The store-level relationship triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationTuple {
    pub subject_type: String,
    pub subject_id: String,
    pub relation: String,
    pub object_type: String,
    pub object_id: String,
}

impl RelationTuple {
    pub fn new(
        subject_type: impl Into<String>,
        subject_id: impl Into<String>,
        relation: impl Into<String>,
        object_type: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
            relation: relation.into(),
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }

    /// The subject key, "type:id".
    pub fn subject_key(&self) -> String {
        format!("{}:{}", self.subject_type, self.subject_id)
    }

    /// The object key, "type:id".
    pub fn object_key(&self) -> String {
        format!("{}:{}", self.object_type, self.object_id)
    }
}

impl fmt::Display for RelationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}@{}",
            self.object_key(),
            self.relation,
            self.subject_key()
        )
    }
}

/// Splits a store key into its type and id components.
pub fn split_key(key: &str) -> DomainResult<(&str, &str)> {
    let mut parts = key.splitn(2, ':');
    match (parts.next(), parts.next()) {
        (Some(kind), Some(id)) if !kind.is_empty() && !id.is_empty() => Ok((kind, id)),
        _ => Err(DomainError::InvalidKeyFormat {
            value: key.to_string(),
        }),
    }
}

/// Raw object descriptor as submitted by callers.
///
/// `object_type` is a MIME-like type string; see [`FOLDER_MIME_TYPE`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub object_id: String,
    pub object_name: String,
    pub object_type: String,
}

/// Raw subject descriptor as submitted by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDescriptor {
    pub subject_id: String,
    /// "group" marks a group subject; anything else (or absent) is a user.
    #[serde(default)]
    pub subject_type: Option<String>,
}
