//! Inbound operation surface.
//!
//! Ties classification, reconciliation, and verification together behind
//! the five operations callers drive. Transport (routing, auth middleware)
//! is wired elsewhere; this type takes raw descriptors and returns domain
//! results.

use std::sync::Arc;
use std::time::Duration;

use permsync_domain::{
    classify_object, classify_subject, Assignment, ObjectDescriptor, Role, SubjectDescriptor,
};
use permsync_store::RelationshipStore;
use tracing::instrument;

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::verifier::{
    self, EntitlementApi, HttpEntitlementClient, TokenSigner, Verifier, VerifierError,
};

/// The permission reconciliation and verification service.
pub struct PermissionService<S, E> {
    store: Arc<S>,
    reconciler: Reconciler<S>,
    verifier: Verifier<E>,
}

impl<S, E> PermissionService<S, E>
where
    S: RelationshipStore,
    E: EntitlementApi,
{
    pub fn new(store: Arc<S>, verifier: Verifier<E>, concurrency: usize) -> Self {
        let reconciler = Reconciler::new(Arc::clone(&store), concurrency);
        Self {
            store,
            reconciler,
            verifier,
        }
    }

    /// Writes one role assignment, classifying both sides first.
    #[instrument(skip(self, object, subject), fields(object = %object.object_id, subject = %subject.subject_id))]
    pub async fn submit_assignment(
        &self,
        object: &ObjectDescriptor,
        subject: &SubjectDescriptor,
        role: Role,
    ) -> SyncResult<()> {
        let assignment = Assignment::new(
            classify_subject(subject),
            role,
            classify_object(object),
        );
        self.reconciler.write_assignment(&assignment).await
    }

    /// Links a folder to a document with the structural parent edge.
    #[instrument(skip(self))]
    pub async fn submit_folder_link(&self, folder_id: &str, document_id: &str) -> SyncResult<()> {
        self.reconciler
            .write_folder_parent(folder_id, document_id)
            .await
    }

    /// Reconciles the object's assignments to the submitted desired state.
    #[instrument(skip(self, object, entries), fields(object = %object.object_id, entries = entries.len()))]
    pub async fn submit_desired_state(
        &self,
        object: &ObjectDescriptor,
        entries: &[(SubjectDescriptor, Role)],
    ) -> SyncResult<ReconcileReport> {
        let object = classify_object(object);
        let desired: Vec<Assignment> = entries
            .iter()
            .map(|(subject, role)| {
                Assignment::new(classify_subject(subject), *role, object.clone())
            })
            .collect();
        self.reconciler.reconcile(&object, &desired).await
    }

    /// Returns the subset of `document_ids` the third-party authority
    /// confirms visible to the user. Fail-closed: errors yield the empty
    /// set.
    pub async fn check_documents(&self, user_id: &str, document_ids: &[String]) -> Vec<String> {
        self.verifier.verify(user_id, document_ids).await
    }

    /// Lists ids of documents the user directly owns.
    pub async fn list_owned_documents(&self, user_id: &str) -> SyncResult<Vec<String>> {
        verifier::list_owned_documents(self.store.as_ref(), user_id).await
    }
}

impl<S: RelationshipStore> PermissionService<S, HttpEntitlementClient> {
    /// Builds the service from validated configuration, wiring the HTTP
    /// entitlement client and token signer.
    pub fn from_config(store: Arc<S>, config: &SyncConfig) -> Result<Self, VerifierError> {
        let signer = TokenSigner::from_rsa_pem(&config.verifier.signing_key_pem)?;
        let client = HttpEntitlementClient::new(
            &config.verifier.endpoint,
            Duration::from_secs(config.verifier.request_timeout_secs),
        )?;
        let verifier = Verifier::new(signer, Arc::new(client))
            .with_legacy_single_check(config.verifier.legacy_single_check);
        Ok(Self::new(store, verifier, config.sync.concurrency))
    }
}
