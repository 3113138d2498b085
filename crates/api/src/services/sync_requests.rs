//! Sync requests and their mirrored rows in company databases.
//!
//! Dispatch writes a row into the company's `AttandanceSynchronization`
//! table; the company's own job picks it up and reports back through the
//! same row, which polling and the reconcile job read.

use std::sync::Arc;

use domain::models::sync_request::{
    CreateSyncRequestRequest, SyncRequestView, SyncStatusResponse,
};
use domain::models::{NewExternalSyncRow, RequestStatus, SyncRequest};
use domain::services::{reconcile_external_status, validate_sync_window, Reconciliation};
use persistence::external::{ExternalConnectionSpec, ExternalGateway};
use persistence::repositories::{
    CompanyRepository, DatabaseAccessRepository, NewSyncRequest, RequestFilter,
    SyncRequestRepository, SyncTransition, ToolRepository,
};
use shared::pagination::{PageRequest, Paginated};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_request_event;

use super::workflow::{ensure_transition, CredentialResolver, WorkflowError};

const KIND: &str = "sync_request";

/// Status poll result; `message` explains an unreachable company database.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: SyncStatusResponse,
    pub message: String,
}

/// Counters from one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub completed: usize,
    pub failed: usize,
    pub unreachable: usize,
}

#[derive(Clone)]
pub struct SyncRequestService {
    requests: SyncRequestRepository,
    companies: CompanyRepository,
    tools: ToolRepository,
    grants: DatabaseAccessRepository,
    credentials: CredentialResolver,
    gateway: Arc<dyn ExternalGateway>,
    max_range_days: u32,
}

impl SyncRequestService {
    pub fn new(
        pool: PgPool,
        credentials: CredentialResolver,
        gateway: Arc<dyn ExternalGateway>,
        max_range_days: u32,
    ) -> Self {
        Self {
            requests: SyncRequestRepository::new(pool.clone()),
            companies: CompanyRepository::new(pool.clone()),
            tools: ToolRepository::new(pool.clone()),
            grants: DatabaseAccessRepository::new(pool),
            credentials,
            gateway,
            max_range_days,
        }
    }

    pub async fn create(
        &self,
        user: &CurrentUser,
        request: &CreateSyncRequestRequest,
    ) -> Result<SyncRequestView, WorkflowError> {
        validate_sync_window(request.from_date, request.to_date, self.max_range_days)?;

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
        if !self.grants.has_active_grant(user.id, company.id).await? {
            return Err(WorkflowError::NoAccess);
        }

        let created = self
            .requests
            .create(NewSyncRequest {
                user_id: user.id,
                company_id: company.id,
                tool_id: tool.id,
                from_date: request.from_date,
                to_date: request.to_date,
                remarks: request
                    .remarks
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty()),
            })
            .await?;

        record_request_event(KIND, "created");
        info!(
            request_id = %created.id,
            user_id = %user.id,
            company_id = %company.id,
            from = %request.from_date,
            to = %request.to_date,
            "Sync request created"
        );
        self.get(created.id).await
    }

    pub async fn list(
        &self,
        filter: RequestFilter,
        page: PageRequest,
    ) -> Result<Paginated<SyncRequestView>, WorkflowError> {
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

    pub async fn get(&self, id: Uuid) -> Result<SyncRequestView, WorkflowError> {
        self.requests
            .find_view_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(WorkflowError::NotFound("Sync request"))
    }

    /// Other users' requests are reported as missing.
    pub async fn get_owned(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<SyncRequestView, WorkflowError> {
        let view = self.get(id).await?;
        if view.request.user_id != user.id {
            return Err(WorkflowError::NotFound("Sync request"));
        }
        Ok(view)
    }

    /// Owner-only, `NR` only.
    pub async fn cancel(&self, user: &CurrentUser, id: Uuid) -> Result<SyncRequest, WorkflowError> {
        let current = self.load(id).await?;
        if current.user_id != user.id {
            return Err(WorkflowError::NotOwner);
        }
        ensure_transition(current.status, RequestStatus::Cancelled)?;

        let change = SyncTransition::new(id, current.status, RequestStatus::Cancelled);
        match self.requests.transition(change).await? {
            Some(entity) => {
                record_request_event(KIND, "cancelled");
                info!(request_id = %id, user_id = %user.id, "Sync request cancelled");
                Ok(entity.into())
            }
            None => Err(self.lost_race(id, "cancelled").await),
        }
    }

    /// Current status, refreshed from the mirrored row while `IP`.
    ///
    /// When `owner` is given, other users' requests are reported as missing.
    /// An unreachable company database leaves the local status unchanged.
    pub async fn poll_status(
        &self,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<PollOutcome, WorkflowError> {
        let current = self.load(id).await?;
        if owner.is_some_and(|owner| owner != current.user_id) {
            return Err(WorkflowError::NotFound("Sync request"));
        }
        if !current.awaits_external_result() {
            return Ok(PollOutcome {
                status: current.status_response(),
                message: "OK".to_string(),
            });
        }

        match self.refresh_from_external(&current).await {
            Ok(refreshed) => Ok(PollOutcome {
                status: refreshed.status_response(),
                message: "OK".to_string(),
            }),
            Err(e) => {
                warn!(request_id = %id, error = %e, "Status poll could not read company database");
                Ok(PollOutcome {
                    status: current.status_response(),
                    message: format!("Status could not be refreshed: {}", e),
                })
            }
        }
    }

    /// `NR` to `IP`: the local change commits only once the mirrored row
    /// exists. On failure the status stays `NR` and `last_error` is set.
    pub async fn dispatch(&self, admin: &CurrentUser, id: Uuid) -> Result<SyncRequest, WorkflowError> {
        let current = self.load(id).await?;
        ensure_transition(current.status, RequestStatus::InProgress)?;

        let (spec, tool_code) = match self.external_target(&current).await {
            Ok(target) => target,
            Err(e) => {
                self.note_failure(id, "dispatch_failed", &e).await;
                return Err(e);
            }
        };

        let mut tx = self.requests.pool().begin().await?;
        let claimed = SyncRequestRepository::transition_on(
            &mut *tx,
            SyncTransition::new(id, RequestStatus::New, RequestStatus::InProgress)
                .processed_by(admin.id),
        )
        .await?;
        let Some(claimed) = claimed else {
            tx.rollback().await?;
            return Err(self.lost_race(id, "dispatched").await);
        };

        let row = NewExternalSyncRow {
            request_id: claimed.id,
            tool_code,
            from_date: claimed.from_date,
            to_date: claimed.to_date,
            status: RequestStatus::InProgress,
            remarks: claimed.remarks.clone(),
        };
        let external_ref = match self.gateway.insert_sync_row(&spec, &row).await {
            Ok(external_ref) => external_ref,
            Err(e) => {
                tx.rollback().await?;
                let err = WorkflowError::from(e);
                self.note_failure(id, "dispatch_failed", &err).await;
                return Err(err);
            }
        };

        let dispatched = SyncRequestRepository::set_external_ref(&mut *tx, id, external_ref).await?;
        tx.commit().await?;

        record_request_event(KIND, "dispatched");
        info!(
            request_id = %id,
            admin_id = %admin.id,
            company_id = %dispatched.company_id,
            external_ref,
            target = %spec.target(),
            "Sync request dispatched"
        );
        Ok(dispatched.into())
    }

    /// `IP` to `CP`. The mirrored row is updated afterwards on a best-effort
    /// basis; a failure there is stored in `last_error`.
    pub async fn complete(
        &self,
        admin: &CurrentUser,
        id: Uuid,
        admin_note: Option<&str>,
    ) -> Result<SyncRequest, WorkflowError> {
        let current = self.load(id).await?;
        ensure_transition(current.status, RequestStatus::Completed)?;

        let note = admin_note.map(str::trim).filter(|n| !n.is_empty());
        let change = SyncTransition::new(id, current.status, RequestStatus::Completed)
            .processed_by(admin.id)
            .admin_note(note);
        let Some(completed) = self.requests.transition(change).await? else {
            return Err(self.lost_race(id, "completed").await);
        };

        record_request_event(KIND, "completed");
        info!(request_id = %id, admin_id = %admin.id, "Sync request completed");

        let completed: SyncRequest = completed.into();
        Ok(self
            .mirror_status(completed, RequestStatus::Completed, note)
            .await)
    }

    /// `NR` or `IP` to `RR`, mirrored when a row exists.
    pub async fn reject(
        &self,
        admin: &CurrentUser,
        id: Uuid,
        admin_note: Option<&str>,
    ) -> Result<SyncRequest, WorkflowError> {
        let current = self.load(id).await?;
        ensure_transition(current.status, RequestStatus::Rejected)?;

        let note = admin_note.map(str::trim).filter(|n| !n.is_empty());
        let change = SyncTransition::new(id, current.status, RequestStatus::Rejected)
            .processed_by(admin.id)
            .admin_note(note);
        let Some(rejected) = self.requests.transition(change).await? else {
            return Err(self.lost_race(id, "rejected").await);
        };

        record_request_event(KIND, "rejected");
        info!(request_id = %id, admin_id = %admin.id, "Sync request rejected");

        let rejected: SyncRequest = rejected.into();
        Ok(self.mirror_status(rejected, RequestStatus::Rejected, note).await)
    }

    /// Refreshes up to `limit` in-progress requests from their mirrored rows.
    pub async fn reconcile_pending(&self, limit: i64) -> Result<ReconcileSummary, WorkflowError> {
        let pending = self.requests.list_awaiting_external(limit).await?;
        let mut summary = ReconcileSummary::default();

        for entity in pending {
            let request: SyncRequest = entity.into();
            summary.checked += 1;
            match self.refresh_from_external(&request).await {
                Ok(refreshed) => match refreshed.status {
                    RequestStatus::Completed => summary.completed += 1,
                    RequestStatus::Rejected => summary.failed += 1,
                    _ => {}
                },
                Err(e) => {
                    summary.unreachable += 1;
                    warn!(request_id = %request.id, error = %e, "Reconcile could not read company database");
                }
            }
        }
        Ok(summary)
    }

    /// Reads the mirrored row and applies what it reports.
    async fn refresh_from_external(&self, current: &SyncRequest) -> Result<SyncRequest, WorkflowError> {
        let Some(external_ref) = current.external_ref else {
            return Ok(current.clone());
        };
        let spec = self.credentials.for_company(current.company_id).await?;
        let Some(row) = self.gateway.fetch_sync_row(&spec, external_ref).await? else {
            warn!(request_id = %current.id, external_ref, "Mirrored sync row is missing");
            return Ok(current.clone());
        };

        let change = match reconcile_external_status(current.status, &row.status, row.remarks.as_deref()) {
            Reconciliation::Unchanged => return Ok(current.clone()),
            Reconciliation::Complete => {
                SyncTransition::new(current.id, RequestStatus::InProgress, RequestStatus::Completed)
            }
            Reconciliation::Fail(reason) => {
                return self.apply_external_failure(current, &reason).await;
            }
        };

        match self.requests.transition(change).await? {
            Some(updated) => {
                record_request_event(KIND, "completed");
                info!(request_id = %current.id, external_ref, "Sync request completed by company job");
                Ok(updated.into())
            }
            None => self.load(current.id).await,
        }
    }

    async fn apply_external_failure(
        &self,
        current: &SyncRequest,
        reason: &str,
    ) -> Result<SyncRequest, WorkflowError> {
        let change = SyncTransition::new(current.id, RequestStatus::InProgress, RequestStatus::Rejected)
            .last_error(Some(reason));
        match self.requests.transition(change).await? {
            Some(updated) => {
                record_request_event(KIND, "failed");
                info!(request_id = %current.id, reason, "Sync request failed in company job");
                Ok(updated.into())
            }
            None => self.load(current.id).await,
        }
    }

    /// Writes a terminal status to the mirrored row, if there is one.
    async fn mirror_status(
        &self,
        request: SyncRequest,
        status: RequestStatus,
        remarks: Option<&str>,
    ) -> SyncRequest {
        let Some(external_ref) = request.external_ref else {
            return request;
        };

        let result: Result<bool, WorkflowError> = async {
            let spec = self.credentials.for_company(request.company_id).await?;
            self.gateway
                .update_sync_status(&spec, external_ref, status, remarks)
                .await
                .map_err(WorkflowError::from)
        }
        .await;

        match result {
            Ok(true) => request,
            Ok(false) => {
                warn!(request_id = %request.id, external_ref, "Mirrored sync row no longer exists");
                request
            }
            Err(e) => {
                self.note_failure(request.id, "mirror_failed", &e).await;
                SyncRequest {
                    last_error: Some(e.to_string()),
                    ..request
                }
            }
        }
    }

    async fn external_target(
        &self,
        request: &SyncRequest,
    ) -> Result<(ExternalConnectionSpec, String), WorkflowError> {
        let tool = self
            .tools
            .find_by_id(request.tool_id)
            .await?
            .ok_or(WorkflowError::NotFound("Tool"))?;
        let spec = self.credentials.for_company(request.company_id).await?;
        Ok((spec, tool.code))
    }

    /// Stores the error on the request without changing its status.
    async fn note_failure(&self, id: Uuid, event: &'static str, error: &WorkflowError) {
        record_request_event(KIND, event);
        warn!(request_id = %id, error = %error, "Company database step failed");
        if let Err(e) = self.requests.record_error(id, &error.to_string()).await {
            warn!(request_id = %id, error = %e, "Failed to record sync request error");
        }
    }

    async fn load(&self, id: Uuid) -> Result<SyncRequest, WorkflowError> {
        self.requests
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(WorkflowError::NotFound("Sync request"))
    }

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
