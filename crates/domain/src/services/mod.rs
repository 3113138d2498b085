//! Domain services.
//!
//! Pure business rules that operate on domain models without storage.

pub mod request_rules;

pub use request_rules::{
    plan_provisioning, reconcile_external_status, validate_sync_window, MissingCredentials,
    ProvisionAction, Reconciliation, SyncWindowError,
};
