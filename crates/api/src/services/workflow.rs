//! Shared pieces of the access and sync request workflows.

use domain::models::{RequestStatus, TransitionError};
use domain::services::{MissingCredentials, SyncWindowError};
use persistence::entities::DatabaseAssignmentEntity;
use persistence::external::{ConnectionOptions, ExternalConnectionSpec, ExternalDbError};
use persistence::repositories::{DatabaseAssignmentRepository, ServerIpRepository};
use shared::crypto::{CredentialCipher, CryptoError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} is not active")]
    Inactive(&'static str),

    #[error("An open request for this company already exists")]
    OpenRequestExists,

    #[error("You already have access to this company")]
    AlreadyGranted,

    #[error("You do not have access to this company")]
    NoAccess,

    #[error("Only the owner can cancel a request")]
    NotOwner,

    /// The row moved on before the conditional update ran.
    #[error("Request is {} and can no longer be {action}", .current.label())]
    StatusConflict {
        current: RequestStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Window(#[from] SyncWindowError),

    #[error(transparent)]
    MissingCredentials(#[from] MissingCredentials),

    #[error("Company has no active database assignment")]
    NoAssignment,

    #[error("Company database error: {0}")]
    External(#[from] ExternalDbError),

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(_) => ApiError::NotFound(err.to_string()),
            WorkflowError::Inactive(what) => {
                let field = match what {
                    "Tool" => "tool_id",
                    "Server IP" => "credentials.server_ip_id",
                    _ => "company_id",
                };
                ApiError::field(field, err.to_string())
            }
            WorkflowError::OpenRequestExists
            | WorkflowError::AlreadyGranted
            | WorkflowError::StatusConflict { .. }
            | WorkflowError::NoAssignment => ApiError::Conflict(err.to_string()),
            WorkflowError::NoAccess | WorkflowError::NotOwner => {
                ApiError::Forbidden(err.to_string())
            }
            WorkflowError::Transition(e) => e.into(),
            WorkflowError::Window(e) => e.into(),
            WorkflowError::MissingCredentials(e) => e.into(),
            WorkflowError::External(e) => e.into(),
            WorkflowError::Crypto(e) => e.into(),
            WorkflowError::Database(e) => e.into(),
        }
    }
}

/// Checks the transition table before touching storage so callers get a
/// precise error instead of a lost conditional update.
pub fn ensure_transition(
    current: RequestStatus,
    next: RequestStatus,
) -> Result<(), WorkflowError> {
    current.transition(next)?;
    Ok(())
}

/// Builds connection specs for company databases from stored assignments.
#[derive(Clone)]
pub struct CredentialResolver {
    assignments: DatabaseAssignmentRepository,
    server_ips: ServerIpRepository,
    cipher: CredentialCipher,
    options: ConnectionOptions,
}

impl CredentialResolver {
    pub fn new(pool: PgPool, cipher: CredentialCipher, options: ConnectionOptions) -> Self {
        Self {
            assignments: DatabaseAssignmentRepository::new(pool.clone()),
            server_ips: ServerIpRepository::new(pool),
            cipher,
            options,
        }
    }

    /// Spec for the company's active assignment.
    pub async fn for_company(&self, company_id: Uuid) -> Result<ExternalConnectionSpec, WorkflowError> {
        let assignment = self
            .assignments
            .find_active_for_company(company_id)
            .await?
            .ok_or(WorkflowError::NoAssignment)?;
        self.for_assignment(&assignment).await
    }

    /// Spec for one assignment, active or not.
    pub async fn for_assignment(
        &self,
        assignment: &DatabaseAssignmentEntity,
    ) -> Result<ExternalConnectionSpec, WorkflowError> {
        let server = self
            .server_ips
            .find_by_id(assignment.server_ip_id)
            .await?
            .ok_or(WorkflowError::NotFound("Server IP"))?;
        let password = self.cipher.decrypt(&assignment.encrypted_password)?;

        Ok(ExternalConnectionSpec::new(
            server.ip_address,
            server.port,
            assignment.database_name.clone(),
            assignment.db_username.clone(),
            password,
            self.options,
        )?)
    }
}
