//! Third-party entitlement verification.
//!
//! The relationship store's decisions are cross-validated against an
//! independently trusted authority. Each check mints a fresh short-lived
//! RS256 assertion and sends the candidate document batch with it; any
//! signing, network, or parse failure degrades to an empty permitted set.
//! Fail-closed is a required safety property here: "no third-party
//! confirmation" must read as "not permitted", never the other way around.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use permsync_domain::types::split_key;
use permsync_domain::{ObjectKind, Role, SubjectKind};
use permsync_store::RelationshipStore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Assertion lifetime: one hour from issuance.
pub const ASSERTION_TTL_SECS: i64 = 3600;

/// Errors talking to the entitlement authority or minting assertions.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("invalid signing key: {message}")]
    InvalidKey { message: String },

    #[error("failed to sign assertion: {message}")]
    Signing { message: String },

    #[error("entitlement request failed: {message}")]
    Http { message: String },

    #[error("entitlement authority returned status {status}")]
    UnexpectedStatus { status: u16 },
}

/// Result type for verifier operations.
pub type VerifierResult<T> = Result<T, VerifierError>;

impl From<reqwest::Error> for VerifierError {
    fn from(err: reqwest::Error) -> Self {
        VerifierError::Http {
            message: err.to_string(),
        }
    }
}

/// Bearer assertion claims: subject, issued-at, expiry.
#[derive(Debug, Serialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Mints short-lived RS256 assertions from a process-held private key.
pub struct TokenSigner {
    key: EncodingKey,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Parses an RSA private key in PEM form.
    ///
    /// Escaped `\n` sequences are unescaped first, so keys passed through
    /// single-line environment variables work unchanged.
    pub fn from_rsa_pem(pem: &str) -> VerifierResult<Self> {
        let pem = pem.replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
            VerifierError::InvalidKey {
                message: e.to_string(),
            }
        })?;
        Ok(Self { key })
    }

    /// Signs a fresh assertion for the user: `{sub, iat: now, exp: now+1h}`.
    pub fn sign(&self, user_id: &str) -> VerifierResult<String> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key).map_err(|e| {
            VerifierError::Signing {
                message: e.to_string(),
            }
        })
    }
}

/// Batch check request sent to the entitlement authority.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub user_id: String,
    pub document_ids: Vec<String>,
}

/// Batch check response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub permitted_files: Vec<PermittedFile>,
}

/// Per-document permitted flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermittedFile {
    pub file_id: String,
    pub permitted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SingleCheckRequest<'a> {
    user_id: &'a str,
    file_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleCheckResponse {
    is_permitted: bool,
}

/// Contract over the entitlement authority's HTTP surface.
#[async_trait]
pub trait EntitlementApi: Send + Sync + 'static {
    /// One call carrying the full candidate batch.
    async fn check_batch(
        &self,
        token: &str,
        request: &VerificationRequest,
    ) -> VerifierResult<VerificationResponse>;

    /// Legacy one-call-per-document protocol.
    async fn check_single(
        &self,
        token: &str,
        user_id: &str,
        document_id: &str,
    ) -> VerifierResult<bool>;
}

/// HTTP client for the entitlement authority.
#[derive(Debug)]
pub struct HttpEntitlementClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpEntitlementClient {
    /// Builds a client with a per-call timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> VerifierResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl EntitlementApi for HttpEntitlementClient {
    async fn check_batch(
        &self,
        token: &str,
        request: &VerificationRequest,
    ) -> VerifierResult<VerificationResponse> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(VerifierError::UnexpectedStatus {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<VerificationResponse>().await?)
    }

    async fn check_single(
        &self,
        token: &str,
        user_id: &str,
        document_id: &str,
    ) -> VerifierResult<bool> {
        let body = SingleCheckRequest {
            user_id,
            file_id: document_id,
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(VerifierError::UnexpectedStatus {
                status: resp.status().as_u16(),
            });
        }

        let parsed = resp.json::<SingleCheckResponse>().await?;
        Ok(parsed.is_permitted)
    }
}

/// Filters candidate documents down to those the external authority
/// independently confirms visible.
pub struct Verifier<E> {
    signer: TokenSigner,
    api: Arc<E>,
    legacy_single_check: bool,
}

impl<E: EntitlementApi> Verifier<E> {
    pub fn new(signer: TokenSigner, api: Arc<E>) -> Self {
        Self {
            signer,
            api,
            legacy_single_check: false,
        }
    }

    /// Switches to the one-call-per-document protocol.
    pub fn with_legacy_single_check(mut self, enabled: bool) -> Self {
        self.legacy_single_check = enabled;
        self
    }

    /// Returns the subset of `document_ids` the authority confirms
    /// permitted for the user, in the response's own order.
    ///
    /// Degrades to an empty result on any failure. Callers must treat an
    /// empty result as "not permitted", never as "permitted by default".
    pub async fn verify(&self, user_id: &str, document_ids: &[String]) -> Vec<String> {
        if document_ids.is_empty() {
            return Vec::new();
        }

        let token = match self.signer.sign(user_id) {
            Ok(token) => token,
            Err(err) => {
                warn!(user = %user_id, error = %err, "assertion signing failed; failing closed");
                return Vec::new();
            }
        };

        let outcome = if self.legacy_single_check {
            self.verify_each(&token, user_id, document_ids).await
        } else {
            self.verify_batch(&token, user_id, document_ids).await
        };

        match outcome {
            Ok(permitted) => {
                debug!(
                    user = %user_id,
                    candidates = document_ids.len(),
                    permitted = permitted.len(),
                    "entitlement check complete"
                );
                permitted
            }
            Err(err) => {
                warn!(user = %user_id, error = %err, "entitlement check failed; failing closed");
                Vec::new()
            }
        }
    }

    async fn verify_batch(
        &self,
        token: &str,
        user_id: &str,
        document_ids: &[String],
    ) -> VerifierResult<Vec<String>> {
        let request = VerificationRequest {
            user_id: user_id.to_string(),
            document_ids: document_ids.to_vec(),
        };
        let response = self.api.check_batch(token, &request).await?;

        Ok(response
            .permitted_files
            .into_iter()
            .filter(|f| f.permitted)
            .map(|f| f.file_id)
            .collect())
    }

    async fn verify_each(
        &self,
        token: &str,
        user_id: &str,
        document_ids: &[String],
    ) -> VerifierResult<Vec<String>> {
        let mut permitted = Vec::new();
        for id in document_ids {
            if self.api.check_single(token, user_id, id).await? {
                permitted.push(id.clone());
            }
        }
        Ok(permitted)
    }
}

/// Lists the ids of documents the user directly owns, via the store's
/// reverse lookup. Only the id component of each returned key is kept.
pub async fn list_owned_documents<S: RelationshipStore>(
    store: &S,
    user_id: &str,
) -> SyncResult<Vec<String>> {
    let subject_key = format!("{}:{}", SubjectKind::User.as_str(), user_id);
    let keys = store
        .list_objects_with_relation(
            &subject_key,
            Role::Owner.as_str(),
            ObjectKind::Document.as_str(),
        )
        .await?;

    let mut ids = Vec::with_capacity(keys.len());
    for key in keys {
        let (_, id) = split_key(&key).map_err(|_| SyncError::MalformedKey { value: key.clone() })?;
        ids.push(id.to_string());
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use permsync_domain::RelationTuple;
    use permsync_store::MemoryRelationshipStore;
    use std::sync::Mutex;

    const TEST_KEY_PEM: &str = include_str!("../tests/fixtures/test_rsa_key.pem");

    /// Scripted entitlement authority double.
    struct ScriptedApi {
        /// file id -> permitted flag; `None` makes every call fail.
        outcome: Option<Vec<(String, bool)>>,
        batch_calls: Mutex<Vec<VerificationRequest>>,
        single_calls: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn respond(entries: &[(&str, bool)]) -> Self {
            Self {
                outcome: Some(
                    entries
                        .iter()
                        .map(|(id, ok)| (id.to_string(), *ok))
                        .collect(),
                ),
                batch_calls: Mutex::new(Vec::new()),
                single_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                outcome: None,
                batch_calls: Mutex::new(Vec::new()),
                single_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EntitlementApi for ScriptedApi {
        async fn check_batch(
            &self,
            _token: &str,
            request: &VerificationRequest,
        ) -> VerifierResult<VerificationResponse> {
            self.batch_calls.lock().unwrap().push(request.clone());
            match &self.outcome {
                Some(entries) => Ok(VerificationResponse {
                    permitted_files: entries
                        .iter()
                        .map(|(id, ok)| PermittedFile {
                            file_id: id.clone(),
                            permitted: *ok,
                        })
                        .collect(),
                }),
                None => Err(VerifierError::Http {
                    message: "connection refused".to_string(),
                }),
            }
        }

        async fn check_single(
            &self,
            _token: &str,
            _user_id: &str,
            document_id: &str,
        ) -> VerifierResult<bool> {
            self.single_calls
                .lock()
                .unwrap()
                .push(document_id.to_string());
            match &self.outcome {
                Some(entries) => Ok(entries
                    .iter()
                    .any(|(id, ok)| id == document_id && *ok)),
                None => Err(VerifierError::Http {
                    message: "connection refused".to_string(),
                }),
            }
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::from_rsa_pem(TEST_KEY_PEM).unwrap()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn returns_only_permitted_ids() {
        let api = Arc::new(ScriptedApi::respond(&[("d1", true), ("d2", false)]));
        let verifier = Verifier::new(signer(), Arc::clone(&api));

        let permitted = verifier.verify("u1", &ids(&["d1", "d2"])).await;

        assert_eq!(permitted, vec!["d1".to_string()]);
        let calls = api.batch_calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "batch mode issues exactly one call");
        assert_eq!(calls[0].user_id, "u1");
        assert_eq!(calls[0].document_ids, ids(&["d1", "d2"]));
    }

    #[tokio::test]
    async fn network_failure_fails_closed() {
        let api = Arc::new(ScriptedApi::failing());
        let verifier = Verifier::new(signer(), api);

        let permitted = verifier.verify("u1", &ids(&["d1", "d2"])).await;

        assert!(
            permitted.is_empty(),
            "failure must yield the empty set, never the unfiltered input"
        );
    }

    #[tokio::test]
    async fn empty_candidate_list_short_circuits() {
        let api = Arc::new(ScriptedApi::respond(&[]));
        let verifier = Verifier::new(signer(), Arc::clone(&api));

        let permitted = verifier.verify("u1", &[]).await;

        assert!(permitted.is_empty());
        assert!(api.batch_calls.lock().unwrap().is_empty(), "no call issued");
    }

    #[tokio::test]
    async fn legacy_mode_checks_each_document() {
        let api = Arc::new(ScriptedApi::respond(&[("d1", true), ("d2", false), ("d3", true)]));
        let verifier =
            Verifier::new(signer(), Arc::clone(&api)).with_legacy_single_check(true);

        let permitted = verifier.verify("u1", &ids(&["d1", "d2", "d3"])).await;

        assert_eq!(permitted, ids(&["d1", "d3"]));
        assert_eq!(api.single_calls.lock().unwrap().len(), 3);
        assert!(api.batch_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn assertion_carries_subject_and_one_hour_expiry() {
        let token = signer().sign("u1").unwrap();

        let payload_b64 = token.split('.').nth(1).unwrap();
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(claims["sub"], "u1");
        let iat = claims["iat"].as_i64().unwrap();
        let exp = claims["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, ASSERTION_TTL_SECS);

        let now = Utc::now().timestamp();
        assert!((now - iat).abs() < 30, "iat should be about now");
    }

    #[test]
    fn signer_accepts_escaped_newlines_in_pem() {
        let escaped = TEST_KEY_PEM.replace('\n', "\\n");
        assert!(TokenSigner::from_rsa_pem(&escaped).is_ok());
    }

    #[test]
    fn signer_rejects_garbage_key_material() {
        let err = TokenSigner::from_rsa_pem("not a key").unwrap_err();
        assert!(matches!(err, VerifierError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn owned_documents_strip_the_key_prefix() {
        let store = MemoryRelationshipStore::new();
        store
            .write(vec![
                RelationTuple::new("user", "u1", "owner", "doc", "d1"),
                RelationTuple::new("user", "u1", "owner", "doc", "d2"),
                RelationTuple::new("user", "u1", "viewer", "doc", "d3"),
                RelationTuple::new("user", "u2", "owner", "doc", "d4"),
            ])
            .await
            .unwrap();

        let owned = list_owned_documents(&store, "u1").await.unwrap();
        assert_eq!(owned, ids(&["d1", "d2"]));
    }
}
