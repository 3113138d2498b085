//! Access requests: a user asks to sync a company, an admin approves and
//! provisions the company's database credentials.

use domain::models::company_request::{
    ApproveCompanyRequestRequest, CompanyRequestView, CreateCompanyRequestRequest,
};
use domain::models::{CompanyRequest, RequestStatus};
use domain::services::ProvisionAction;
use persistence::repositories::{
    ApprovalOutcome, CompanyRepository, CompanyRequestRepository, DatabaseAccessRepository,
    RequestFilter, SealedCredentials, ServerIpRepository, ToolRepository,
};
use shared::crypto::CredentialCipher;
use shared::pagination::{PageRequest, Paginated};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_request_event;

use super::workflow::{ensure_transition, WorkflowError};

const KIND: &str = "company_request";

/// Result of a successful approval.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApprovedRequest {
    pub request: CompanyRequest,
    /// `keep_existing`, `create` or `replace`.
    pub provisioning: &'static str,
    pub assignment_id: Uuid,
}

fn provisioning_label(action: ProvisionAction) -> &'static str {
    match action {
        ProvisionAction::KeepExisting => "keep_existing",
        ProvisionAction::Create => "create",
        ProvisionAction::Replace => "replace",
    }
}

#[derive(Clone)]
pub struct AccessRequestService {
    requests: CompanyRequestRepository,
    companies: CompanyRepository,
    tools: ToolRepository,
    grants: DatabaseAccessRepository,
    server_ips: ServerIpRepository,
    cipher: CredentialCipher,
}

impl AccessRequestService {
    pub fn new(pool: PgPool, cipher: CredentialCipher) -> Self {
        Self {
            requests: CompanyRequestRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            tools: ToolRepository::new(pool.clone()),
            grants: DatabaseAccessRepository::new(pool.clone()),
            server_ips: ServerIpRepository::new(pool),
            cipher,
        }
    }

    pub async fn create(
        &self,
        user: &CurrentUser,
        request: &CreateCompanyRequestRequest,
    ) -> Result<CompanyRequestView, WorkflowError> {
        let company = self
            .companies
            .find_by_id(request.company_id)
            .await?
            .ok_or(WorkflowError::NotFound("Company"))?;
        if !company.is_active {
            return Err(WorkflowError::Inactive("Company"));
        }
        let tool = self
            .tools
            .find_by_id(request.tool_id)
            .await?
            .ok_or(WorkflowError::NotFound("Tool"))?;
        if !tool.is_active {
            return Err(WorkflowError::Inactive("Tool"));
        }

        if self.requests.has_open_request(user.id, company.id).await? {
            return Err(WorkflowError::OpenRequestExists);
        }
        if self.grants.has_active_grant(user.id, company.id).await? {
            return Err(WorkflowError::AlreadyGranted);
        }

        let remarks = request
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());
        let created = self
            .requests
            .create(user.id, company.id, tool.id, remarks)
            .await?;

        record_request_event(KIND, "created");
        info!(
            request_id = %created.id,
            user_id = %user.id,
            company_id = %company.id,
            "Access request created"
        );
        self.get(created.id).await
    }

    pub async fn list(
        &self,
        filter: RequestFilter,
        page: PageRequest,
    ) -> Result<Paginated<CompanyRequestView>, WorkflowError> {
        let items = self
            .requests
            .list(filter, page.limit(), page.offset())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let total = self.requests.count(filter).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<CompanyRequestView, WorkflowError> {
        self.requests
            .find_view_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(WorkflowError::NotFound("Request"))
    }

    /// Other users' requests are reported as missing.
    pub async fn get_owned(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<CompanyRequestView, WorkflowError> {
        let view = self.get(id).await?;
        if view.request.user_id != user.id {
            return Err(WorkflowError::NotFound("Request"));
        }
        Ok(view)
    }

    /// Owner-only, `NR` only.
    pub async fn cancel(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<CompanyRequest, WorkflowError> {
        let current: CompanyRequest = self.load(id).await?;
        if current.user_id != user.id {
            return Err(WorkflowError::NotOwner);
        }
        ensure_transition(current.status, RequestStatus::Cancelled)?;

        let updated = self
            .requests
            .transition(id, current.status, RequestStatus::Cancelled, None, None)
            .await?;
        match updated {
            Some(entity) => {
                record_request_event(KIND, "cancelled");
                info!(request_id = %id, user_id = %user.id, "Access request cancelled");
                Ok(entity.into())
            }
            None => Err(self.lost_race(id, "cancelled").await),
        }
    }

    /// Approves an `NR` request, provisioning credentials when supplied.
    pub async fn approve(
        &self,
        admin: &CurrentUser,
        id: Uuid,
        request: &ApproveCompanyRequestRequest,
    ) -> Result<ApprovedRequest, WorkflowError> {
        let sealed = match &request.credentials {
            Some(creds) => {
                let server = self
                    .server_ips
                    .find_by_id(creds.server_ip_id)
                    .await?
                    .ok_or(WorkflowError::NotFound("Server IP"))?;
                if !server.is_active {
                    return Err(WorkflowError::Inactive("Server IP"));
                }
                Some(SealedCredentials {
                    server_ip_id: server.id,
                    database_name: creds.database_name.trim().to_string(),
                    db_username: creds.db_username.trim().to_string(),
                    encrypted_password: self.cipher.encrypt(&creds.password)?,
                })
            }
            None => None,
        };

        let note = request.admin_note.as_deref().map(str::trim).filter(|n| !n.is_empty());
        match self.requests.approve(id, admin.id, note, sealed).await? {
            ApprovalOutcome::Approved {
                request,
                provisioning,
                assignment_id,
            } => {
                record_request_event(KIND, "approved");
                info!(
                    request_id = %id,
                    admin_id = %admin.id,
                    company_id = %request.company_id,
                    provisioning = provisioning_label(provisioning),
                    "Access request approved"
                );
                Ok(ApprovedRequest {
                    request: request.into(),
                    provisioning: provisioning_label(provisioning),
                    assignment_id,
                })
            }
            ApprovalOutcome::MissingCredentials => {
                Err(domain::services::MissingCredentials.into())
            }
            ApprovalOutcome::NotPending => Err(self.lost_race(id, "approved").await),
        }
    }

    /// `NR` or `IP` to `RR`.
    pub async fn reject(
        &self,
        admin: &CurrentUser,
        id: Uuid,
        admin_note: Option<&str>,
    ) -> Result<CompanyRequest, WorkflowError> {
        let current = self.load(id).await?;
        ensure_transition(current.status, RequestStatus::Rejected)?;

        let note = admin_note.map(str::trim).filter(|n| !n.is_empty());
        let updated = self
            .requests
            .transition(id, current.status, RequestStatus::Rejected, Some(admin.id), note)
            .await?;
        match updated {
            Some(entity) => {
                record_request_event(KIND, "rejected");
                info!(request_id = %id, admin_id = %admin.id, "Access request rejected");
                Ok(entity.into())
            }
            None => Err(self.lost_race(id, "rejected").await),
        }
    }

    async fn load(&self, id: Uuid) -> Result<CompanyRequest, WorkflowError> {
        self.requests
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(WorkflowError::NotFound("Request"))
    }

    /// Explains a conditional update that matched no row.
    async fn lost_race(&self, id: Uuid, action: &'static str) -> WorkflowError {
        match self.load(id).await {
            Ok(current) => WorkflowError::StatusConflict {
                current: current.status,
                action,
            },
            Err(e) => e,
        }
    }
}
