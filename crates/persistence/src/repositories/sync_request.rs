//! Sync request repository.

use chrono::NaiveDate;
use domain::models::RequestStatus;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{SyncRequestEntity, SyncRequestViewEntity};
use crate::metrics::QueryTimer;

use super::company_request::RequestFilter;

const SYNC_COLUMNS: &str = "id, user_id, company_id, tool_id, from_date, to_date, status, remarks, \
                            admin_note, external_ref, last_error, processed_by, processed_at, \
                            completed_at, created_at, updated_at";

const SYNC_VIEW_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.company_id, r.tool_id, r.from_date, r.to_date, r.status,
           r.remarks, r.admin_note, r.external_ref, r.last_error, r.processed_by,
           r.processed_at, r.completed_at, r.created_at, r.updated_at,
           u.email AS user_email, c.code AS company_code, c.name AS company_name,
           t.code AS tool_code, t.name AS tool_name
    FROM sync_requests r
    JOIN users u ON u.id = r.user_id
    JOIN sync_companies c ON c.id = r.company_id
    JOIN tools t ON t.id = r.tool_id
"#;

#[derive(Debug, Clone)]
pub struct NewSyncRequest<'a> {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub remarks: Option<&'a str>,
}

/// A conditional status change.
#[derive(Debug, Clone, Copy)]
pub struct SyncTransition<'a> {
    pub id: Uuid,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub processed_by: Option<Uuid>,
    pub admin_note: Option<&'a str>,
    pub last_error: Option<&'a str>,
}

impl<'a> SyncTransition<'a> {
    pub fn new(id: Uuid, from: RequestStatus, to: RequestStatus) -> Self {
        Self {
            id,
            from,
            to,
            processed_by: None,
            admin_note: None,
            last_error: None,
        }
    }

    pub fn processed_by(mut self, admin_id: Uuid) -> Self {
        self.processed_by = Some(admin_id);
        self
    }

    pub fn admin_note(mut self, note: Option<&'a str>) -> Self {
        self.admin_note = note;
        self
    }

    pub fn last_error(mut self, error: Option<&'a str>) -> Self {
        self.last_error = error;
        self
    }
}

#[derive(Clone)]
pub struct SyncRequestRepository {
    pool: PgPool,
}

impl SyncRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(&self, request: NewSyncRequest<'_>) -> Result<SyncRequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_sync_request");
        let result = sqlx::query_as::<_, SyncRequestEntity>(&format!(
            r#"
            INSERT INTO sync_requests (user_id, company_id, tool_id, from_date, to_date, status, remarks)
            VALUES ($1, $2, $3, $4, $5, 'NR', $6)
            RETURNING {}
            "#,
            SYNC_COLUMNS
        ))
        .bind(request.user_id)
        .bind(request.company_id)
        .bind(request.tool_id)
        .bind(request.from_date)
        .bind(request.to_date)
        .bind(request.remarks)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SyncRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_sync_request_by_id");
        let result = sqlx::query_as::<_, SyncRequestEntity>(&format!(
            "SELECT {} FROM sync_requests WHERE id = $1",
            SYNC_COLUMNS
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
    ) -> Result<Option<SyncRequestViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_sync_request_view");
        let result = sqlx::query_as::<_, SyncRequestViewEntity>(&format!(
            "{} WHERE r.id = $1",
            SYNC_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn list(
        &self,
        filter: RequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SyncRequestViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_sync_requests");
        let result = sqlx::query_as::<_, SyncRequestViewEntity>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.company_id = $2)
              AND ($3::uuid IS NULL OR r.user_id = $3)
            ORDER BY r.created_at DESC, r.id
            LIMIT $4 OFFSET $5
            "#,
            SYNC_VIEW_SELECT
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
        let timer = QueryTimer::new("count_sync_requests");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sync_requests r
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

    /// Apply a conditional status change on the pool.
    pub async fn transition(
        &self,
        change: SyncTransition<'_>,
    ) -> Result<Option<SyncRequestEntity>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::transition_on(&mut *conn, change).await
    }

    /// Apply a conditional status change on a connection or transaction.
    ///
    /// Returns `None` when the row is missing or its status is no longer
    /// `change.from`. Moving to `CP` stamps `completed_at`.
    pub async fn transition_on(
        conn: &mut PgConnection,
        change: SyncTransition<'_>,
    ) -> Result<Option<SyncRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_sync_request");
        let result = sqlx::query_as::<_, SyncRequestEntity>(&format!(
            r#"
            UPDATE sync_requests
            SET status = $3,
                processed_by = COALESCE($4, processed_by),
                processed_at = CASE WHEN $4::uuid IS NULL THEN processed_at ELSE NOW() END,
                admin_note = COALESCE($5, admin_note),
                last_error = COALESCE($6, last_error),
                completed_at = CASE WHEN $3 = 'CP' THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            SYNC_COLUMNS
        ))
        .bind(change.id)
        .bind(change.from.code())
        .bind(change.to.code())
        .bind(change.processed_by)
        .bind(change.admin_note)
        .bind(change.last_error)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    /// Record the mirrored row identity inside the dispatch transaction.
    pub async fn set_external_ref(
        conn: &mut PgConnection,
        id: Uuid,
        external_ref: i64,
    ) -> Result<SyncRequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("set_sync_request_external_ref");
        let result = sqlx::query_as::<_, SyncRequestEntity>(&format!(
            r#"
            UPDATE sync_requests
            SET external_ref = $2, last_error = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SYNC_COLUMNS
        ))
        .bind(id)
        .bind(external_ref)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    /// In-progress requests that have a mirrored row, oldest first.
    pub async fn list_awaiting_external(
        &self,
        limit: i64,
    ) -> Result<Vec<SyncRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_sync_requests_awaiting_external");
        let result = sqlx::query_as::<_, SyncRequestEntity>(&format!(
            r#"
            SELECT {}
            FROM sync_requests
            WHERE status = 'IP' AND external_ref IS NOT NULL
            ORDER BY updated_at ASC
            LIMIT $1
            "#,
            SYNC_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Store an error message without touching the status.
    pub async fn record_error(&self, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("record_sync_request_error");
        sqlx::query("UPDATE sync_requests SET last_error = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(())
    }
}
