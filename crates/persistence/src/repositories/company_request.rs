//! Access request repository.
//!
//! Status changes are conditional on the expected current status, so two
//! admins acting on the same request cannot both succeed.

use domain::models::RequestStatus;
use domain::services::{plan_provisioning, ProvisionAction};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CompanyRequestEntity, CompanyRequestViewEntity};
use crate::metrics::QueryTimer;

use super::database_access::DatabaseAccessRepository;
use super::database_assignment::{AssignmentChanges, DatabaseAssignmentRepository, NewAssignment};

const REQUEST_COLUMNS: &str = "id, user_id, company_id, tool_id, status, remarks, admin_note, \
                               processed_by, processed_at, created_at, updated_at";

const REQUEST_VIEW_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.company_id, r.tool_id, r.status, r.remarks, r.admin_note,
           r.processed_by, r.processed_at, r.created_at, r.updated_at,
           u.email AS user_email, c.code AS company_code, c.name AS company_name,
           t.code AS tool_code, t.name AS tool_name
    FROM company_requests r
    JOIN users u ON u.id = r.user_id
    JOIN sync_companies c ON c.id = r.company_id
    JOIN tools t ON t.id = r.tool_id
"#;

/// Filters for request listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub company_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Credentials supplied on approval, password already sealed.
#[derive(Debug, Clone)]
pub struct SealedCredentials {
    pub server_ip_id: Uuid,
    pub database_name: String,
    pub db_username: String,
    pub encrypted_password: String,
}

/// Result of an approval attempt.
#[derive(Debug)]
pub enum ApprovalOutcome {
    Approved {
        request: CompanyRequestEntity,
        provisioning: ProvisionAction,
        assignment_id: Uuid,
    },
    /// The request is missing or no longer `NR`.
    NotPending,
    /// The company has no active assignment and no credentials were given.
    MissingCredentials,
}

#[derive(Clone)]
pub struct CompanyRequestRepository {
    pool: PgPool,
}

impl CompanyRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        tool_id: Uuid,
        remarks: Option<&str>,
    ) -> Result<CompanyRequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_company_request");
        let result = sqlx::query_as::<_, CompanyRequestEntity>(&format!(
            r#"
            INSERT INTO company_requests (user_id, company_id, tool_id, status, remarks)
            VALUES ($1, $2, $3, 'NR', $4)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(tool_id)
        .bind(remarks)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CompanyRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_company_request_by_id");
        let result = sqlx::query_as::<_, CompanyRequestEntity>(&format!(
            "SELECT {} FROM company_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_view_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CompanyRequestViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_company_request_view");
        let result = sqlx::query_as::<_, CompanyRequestViewEntity>(&format!(
            "{} WHERE r.id = $1",
            REQUEST_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// True when the user already has an `NR` or `IP` request for the company.
    pub async fn has_open_request(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_open_company_request");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM company_requests
                WHERE user_id = $1 AND company_id = $2 AND status IN ('NR', 'IP')
            )
            "#,
        )
        .bind(user_id)
        .bind(company_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list(
        &self,
        filter: RequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CompanyRequestViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_company_requests");
        let result = sqlx::query_as::<_, CompanyRequestViewEntity>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.company_id = $2)
              AND ($3::uuid IS NULL OR r.user_id = $3)
            ORDER BY r.created_at DESC, r.id
            LIMIT $4 OFFSET $5
            "#,
            REQUEST_VIEW_SELECT
        ))
        .bind(filter.status.map(|s| s.code()))
        .bind(filter.company_id)
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: RequestFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_company_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM company_requests r
            WHERE ($1::text IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.company_id = $2)
              AND ($3::uuid IS NULL OR r.user_id = $3)
            "#,
        )
        .bind(filter.status.map(|s| s.code()))
        .bind(filter.company_id)
        .bind(filter.user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move a request from `from` to `to`. Returns `None` when the request is
    /// missing or its status is no longer `from`.
    pub async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
        processed_by: Option<Uuid>,
        admin_note: Option<&str>,
    ) -> Result<Option<CompanyRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_company_request");
        let result = sqlx::query_as::<_, CompanyRequestEntity>(&format!(
            r#"
            UPDATE company_requests
            SET status = $3,
                processed_by = COALESCE($4, processed_by),
                processed_at = CASE WHEN $4::uuid IS NULL THEN processed_at ELSE NOW() END,
                admin_note = COALESCE($5, admin_note),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(from.code())
        .bind(to.code())
        .bind(processed_by)
        .bind(admin_note)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Approve an `NR` request in one transaction: provision or keep the
    /// company's credentials, grant the requester access and mark the request
    /// completed.
    pub async fn approve(
        &self,
        id: Uuid,
        admin_id: Uuid,
        admin_note: Option<&str>,
        credentials: Option<SealedCredentials>,
    ) -> Result<ApprovalOutcome, sqlx::Error> {
        let timer = QueryTimer::new("approve_company_request");
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, CompanyRequestEntity>(&format!(
            "SELECT {} FROM company_requests WHERE id = $1 AND status = 'NR' FOR UPDATE",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(pending) = pending else {
            return Ok(ApprovalOutcome::NotPending);
        };

        let active =
            DatabaseAssignmentRepository::active_for_company(&mut *tx, pending.company_id).await?;

        let provisioning = match plan_provisioning(active.is_some(), credentials.is_some()) {
            Ok(action) => action,
            Err(_) => return Ok(ApprovalOutcome::MissingCredentials),
        };

        let assignment_id = match (provisioning, active, credentials) {
            (ProvisionAction::Create, _, Some(creds)) => {
                DatabaseAssignmentRepository::insert(
                    &mut *tx,
                    NewAssignment {
                        company_id: pending.company_id,
                        server_ip_id: creds.server_ip_id,
                        database_name: &creds.database_name,
                        db_username: &creds.db_username,
                        encrypted_password: &creds.encrypted_password,
                        is_active: true,
                        assigned_by: Some(admin_id),
                    },
                )
                .await?
                .id
            }
            (ProvisionAction::Replace, Some(existing), Some(creds)) => {
                DatabaseAssignmentRepository::apply_changes(
                    &mut *tx,
                    existing.id,
                    AssignmentChanges {
                        server_ip_id: Some(creds.server_ip_id),
                        database_name: Some(&creds.database_name),
                        db_username: Some(&creds.db_username),
                        encrypted_password: Some(&creds.encrypted_password),
                        is_active: Some(true),
                        assigned_by: Some(admin_id),
                    },
                )
                .await?
                .map(|a| a.id)
                .unwrap_or(existing.id)
            }
            (_, Some(existing), _) => existing.id,
            // plan_provisioning rules out a missing assignment without credentials
            (_, None, _) => return Ok(ApprovalOutcome::MissingCredentials),
        };

        DatabaseAccessRepository::upsert_active(
            &mut *tx,
            pending.user_id,
            pending.company_id,
            admin_id,
        )
        .await?;

        // NR -> IP -> CP inside the transaction keeps the recorded path valid.
        for (from, to) in [("NR", "IP"), ("IP", "CP")] {
            sqlx::query("UPDATE company_requests SET status = $3 WHERE id = $1 AND status = $2")
                .bind(id)
                .bind(from)
                .bind(to)
                .execute(&mut *tx)
                .await?;
        }

        let request = sqlx::query_as::<_, CompanyRequestEntity>(&format!(
            r#"
            UPDATE company_requests
            SET processed_by = $2, processed_at = NOW(), admin_note = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(admin_id)
        .bind(admin_note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(ApprovalOutcome::Approved {
            request,
            provisioning,
            assignment_id,
        })
    }
}
