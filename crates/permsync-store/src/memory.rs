//! In-memory relationship store for tests and local runs.
//!
//! Uses a `DashSet<RelationTuple>` so writes and deletes are O(1) and
//! naturally idempotent; listing queries are linear scans, which is fine at
//! test scale.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use permsync_domain::RelationTuple;

use crate::error::StoreResult;
use crate::traits::RelationshipStore;

/// In-memory implementation of [`RelationshipStore`].
#[derive(Debug, Default)]
pub struct MemoryRelationshipStore {
    tuples: DashSet<RelationTuple>,
}

impl MemoryRelationshipStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty in-memory store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of tuples currently held. Test observability only.
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Whether the store holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Whether the exact tuple is present.
    pub fn contains(&self, tuple: &RelationTuple) -> bool {
        self.tuples.contains(tuple)
    }
}

#[async_trait]
impl RelationshipStore for MemoryRelationshipStore {
    async fn write(&self, tuples: Vec<RelationTuple>) -> StoreResult<()> {
        // DashSet::insert handles duplicates, so re-writing is idempotent.
        for tuple in tuples {
            self.tuples.insert(tuple);
        }
        Ok(())
    }

    async fn delete(&self, tuples: Vec<RelationTuple>) -> StoreResult<()> {
        for tuple in tuples {
            self.tuples.remove(&tuple);
        }
        Ok(())
    }

    async fn list_subjects_with_relation(
        &self,
        object_key: &str,
        relation: &str,
        subject_type: &str,
    ) -> StoreResult<HashSet<String>> {
        Ok(self
            .tuples
            .iter()
            .filter(|t| {
                t.object_key() == object_key
                    && t.relation == relation
                    && t.subject_type == subject_type
            })
            .map(|t| t.subject_id.clone())
            .collect())
    }

    async fn list_objects_with_relation(
        &self,
        subject_key: &str,
        relation: &str,
        object_type: &str,
    ) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .tuples
            .iter()
            .filter(|t| {
                t.subject_key() == subject_key
                    && t.relation == relation
                    && t.object_type == object_type
            })
            .map(|t| t.object_key())
            .collect();

        // Deterministic order for callers and tests.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer_tuple(user: &str, doc: &str) -> RelationTuple {
        RelationTuple::new("user", user, "viewer", "doc", doc)
    }

    #[tokio::test]
    async fn write_then_list_subjects() {
        let store = MemoryRelationshipStore::new();
        store
            .write(vec![
                viewer_tuple("alice", "d1"),
                viewer_tuple("bob", "d1"),
                viewer_tuple("alice", "d2"),
            ])
            .await
            .unwrap();

        let subjects = store
            .list_subjects_with_relation("doc:d1", "viewer", "user")
            .await
            .unwrap();

        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains("alice"));
        assert!(subjects.contains("bob"));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_subject_type() {
        let store = MemoryRelationshipStore::new();
        store
            .write(vec![
                viewer_tuple("alice", "d1"),
                RelationTuple::new("group", "eng", "viewer", "doc", "d1"),
            ])
            .await
            .unwrap();

        let users = store
            .list_subjects_with_relation("doc:d1", "viewer", "user")
            .await
            .unwrap();
        assert_eq!(users, HashSet::from(["alice".to_string()]));

        let groups = store
            .list_subjects_with_relation("doc:d1", "viewer", "group")
            .await
            .unwrap();
        assert_eq!(groups, HashSet::from(["eng".to_string()]));
    }

    #[tokio::test]
    async fn list_objects_returns_sorted_keys() {
        let store = MemoryRelationshipStore::new();
        store
            .write(vec![
                RelationTuple::new("user", "alice", "owner", "doc", "d2"),
                RelationTuple::new("user", "alice", "owner", "doc", "d1"),
                RelationTuple::new("user", "alice", "viewer", "doc", "d3"),
                RelationTuple::new("user", "bob", "owner", "doc", "d4"),
            ])
            .await
            .unwrap();

        let keys = store
            .list_objects_with_relation("user:alice", "owner", "doc")
            .await
            .unwrap();
        assert_eq!(keys, vec!["doc:d1".to_string(), "doc:d2".to_string()]);
    }

    #[tokio::test]
    async fn write_is_idempotent() {
        let store = MemoryRelationshipStore::new();
        store.write(vec![viewer_tuple("alice", "d1")]).await.unwrap();
        store.write(vec![viewer_tuple("alice", "d1")]).await.unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryRelationshipStore::new();
        let tuple = viewer_tuple("alice", "d1");

        // Deleting an absent tuple succeeds.
        store.delete(vec![tuple.clone()]).await.unwrap();

        store.write(vec![tuple.clone()]).await.unwrap();
        store.delete(vec![tuple.clone()]).await.unwrap();
        store.delete(vec![tuple]).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn concurrent_writes_on_distinct_tuples_all_land() {
        let store = MemoryRelationshipStore::new_shared();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .write(vec![viewer_tuple(&format!("user{i}"), "d1")])
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let subjects = store
            .list_subjects_with_relation("doc:d1", "viewer", "user")
            .await
            .unwrap();
        assert_eq!(subjects.len(), 100);
    }
}
