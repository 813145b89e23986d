//! RelationshipStore trait definition.

use std::collections::HashSet;

use async_trait::async_trait;
use permsync_domain::RelationTuple;

use crate::error::StoreResult;

/// Contract over the external relationship store.
///
/// Implementations must be thread-safe (Send + Sync). All calls are
/// parameterized by a fixed authorization-model identifier held by the
/// implementation, not passed per call. Writes and deletes to the same
/// tuple key are idempotent (last-write-wins), so concurrent operations on
/// distinct tuples need no coordination.
#[async_trait]
pub trait RelationshipStore: Send + Sync + 'static {
    /// Writes the given tuples.
    async fn write(&self, tuples: Vec<RelationTuple>) -> StoreResult<()>;

    /// Deletes the given tuples. Deleting an absent tuple succeeds.
    async fn delete(&self, tuples: Vec<RelationTuple>) -> StoreResult<()>;

    /// Lists the ids of subjects of `subject_type` holding `relation` on
    /// the object identified by `object_key` ("type:id").
    async fn list_subjects_with_relation(
        &self,
        object_key: &str,
        relation: &str,
        subject_type: &str,
    ) -> StoreResult<HashSet<String>>;

    /// Lists the keys ("type:id") of objects of `object_type` on which the
    /// subject identified by `subject_key` holds `relation`.
    async fn list_objects_with_relation(
        &self,
        subject_key: &str,
        relation: &str,
        object_type: &str,
    ) -> StoreResult<Vec<String>>;
}
