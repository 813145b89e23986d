//! Desired-state reconciliation.
//!
//! Converges the relationship store's tuples for an object to a
//! caller-supplied desired assignment set via minimal diff-based writes and
//! deletes. Roles are independent namespaces on the same object and are
//! processed in the fixed [`Role::ALL`] order; per-tuple failures are logged
//! and aggregated into the report, never aborting the surrounding loop.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use permsync_domain::tuple::{parent_tuple, role_tuple};
use permsync_domain::{Assignment, ObjectRef, RelationTuple, Role, SubjectKind};
use permsync_store::RelationshipStore;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Which store operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleOp {
    Write,
    Delete,
}

/// A single failed write or delete, kept for caller inspection.
#[derive(Debug, Clone)]
pub struct TupleFailure {
    pub subject_id: String,
    pub role: Role,
    pub op: TupleOp,
    pub message: String,
}

/// Outcome of one reconciliation pass.
///
/// Partial failures are reported here rather than swallowed: a non-empty
/// `failures` list means some tuples did not converge while the rest did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Tuples written.
    pub added: usize,
    /// Tuples deleted.
    pub removed: usize,
    /// Group-kind desired entries skipped (outside the user-scoped diff).
    pub skipped_groups: usize,
    /// Per-tuple failures, in completion order.
    pub failures: Vec<TupleFailure>,
}

impl ReconcileReport {
    /// True when every issued operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes the minimal additions and removals between current and desired
/// subject-id sets. The two outputs are disjoint by construction.
fn diff(current: &HashSet<String>, desired: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let to_add = desired.difference(current).cloned().collect();
    let to_remove = current.difference(desired).cloned().collect();
    (to_add, to_remove)
}

/// Converges store state toward caller-supplied desired assignments.
pub struct Reconciler<S> {
    store: Arc<S>,
    /// Bound on concurrent per-tuple operations within one role.
    concurrency: usize,
}

impl<S: RelationshipStore> Reconciler<S> {
    pub fn new(store: Arc<S>, concurrency: usize) -> Self {
        Self { store, concurrency }
    }

    /// Reconciles the object's role assignments to the desired set.
    ///
    /// For each role the store's current user-kind holders are fetched; a
    /// fetch failure aborts with [`SyncError::StoreUnavailable`] since no
    /// partial reconciliation is attempted without a baseline. Writes come
    /// from the desired assignments; deletes are derived directly from
    /// `(object, role, subject_id)` so a subject present only in current
    /// state is always removable.
    pub async fn reconcile(
        &self,
        object: &ObjectRef,
        desired: &[Assignment],
    ) -> SyncResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let object_key = object.key();

        for role in Role::ALL {
            let mut desired_users: HashMap<String, &Assignment> = HashMap::new();
            for assignment in desired.iter().filter(|a| a.role == role) {
                if assignment.subject.kind != SubjectKind::User {
                    warn!(
                        subject = %assignment.subject.key(),
                        role = %role,
                        object = %object_key,
                        "group assignment skipped by reconciliation; use the single-write path"
                    );
                    report.skipped_groups += 1;
                    continue;
                }
                desired_users.insert(assignment.subject.id.clone(), assignment);
            }

            let current = self
                .store
                .list_subjects_with_relation(
                    &object_key,
                    role.as_str(),
                    SubjectKind::User.as_str(),
                )
                .await
                .map_err(|source| SyncError::StoreUnavailable { source })?;

            let desired_ids: HashSet<String> = desired_users.keys().cloned().collect();
            let (to_add, to_remove) = diff(&current, &desired_ids);

            if to_add.is_empty() && to_remove.is_empty() {
                debug!(object = %object_key, role = %role, "role already converged");
                continue;
            }

            let ops: Vec<(String, TupleOp, RelationTuple)> = to_add
                .into_iter()
                .map(|id| {
                    let tuple = desired_users[&id].to_tuple();
                    (id, TupleOp::Write, tuple)
                })
                .chain(to_remove.into_iter().map(|id| {
                    let tuple = role_tuple(object, role, &id);
                    (id, TupleOp::Delete, tuple)
                }))
                .collect();

            // Tuples within one role are disjoint, so the fan-out needs no
            // ordering beyond the concurrency bound.
            let results = stream::iter(ops)
                .map(|(subject_id, op, tuple)| {
                    let store = Arc::clone(&self.store);
                    async move {
                        let outcome = match op {
                            TupleOp::Write => store.write(vec![tuple.clone()]).await,
                            TupleOp::Delete => store.delete(vec![tuple.clone()]).await,
                        };
                        (subject_id, op, tuple, outcome)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect::<Vec<_>>()
                .await;

            for (subject_id, op, tuple, outcome) in results {
                match outcome {
                    Ok(()) => match op {
                        TupleOp::Write => report.added += 1,
                        TupleOp::Delete => report.removed += 1,
                    },
                    Err(err) => {
                        warn!(
                            tuple = %tuple,
                            role = %role,
                            subject = %subject_id,
                            error = %err,
                            "tuple operation failed; continuing reconciliation"
                        );
                        report.failures.push(TupleFailure {
                            subject_id,
                            role,
                            op,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    /// Writes a single assignment without diffing.
    pub async fn write_assignment(&self, assignment: &Assignment) -> SyncResult<()> {
        self.store.write(vec![assignment.to_tuple()]).await?;
        Ok(())
    }

    /// Writes the structural folder -> document parent edge.
    pub async fn write_folder_parent(
        &self,
        folder_id: &str,
        document_id: &str,
    ) -> SyncResult<()> {
        self.store
            .write(vec![parent_tuple(folder_id, document_id)])
            .await?;
        Ok(())
    }
}
