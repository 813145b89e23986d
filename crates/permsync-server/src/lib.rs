//! permsync-server: Reconciliation and verification service core
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 permsync-server                   │
//! ├──────────────────────────────────────────────────┤
//! │  reconciler  - desired-state diff & convergence   │
//! │  verifier    - third-party entitlement checks     │
//! │  service     - inbound operation surface          │
//! │  config      - layered configuration              │
//! │  logging     - tracing-subscriber setup           │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Transport wiring (HTTP routing, upload pipeline) lives outside this
//! crate; callers hand classified or raw descriptors to
//! [`service::PermissionService`].

pub mod config;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod service;
pub mod verifier;

pub use config::{ConfigLoadError, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use reconciler::{ReconcileReport, Reconciler, TupleFailure, TupleOp};
pub use service::PermissionService;
pub use verifier::{EntitlementApi, HttpEntitlementClient, TokenSigner, Verifier};
