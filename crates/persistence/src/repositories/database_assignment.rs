//! Database assignment repository.
//!
//! Rows hold sealed passwords; listings go through the view query, which only
//! reports whether a password is present.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{DatabaseAssignmentEntity, DatabaseAssignmentViewEntity};
use crate::metrics::QueryTimer;

use super::like_pattern;

const ASSIGNMENT_COLUMNS: &str = "id, company_id, server_ip_id, database_name, db_username, \
                                  encrypted_password, is_active, assigned_by, created_at, updated_at";

const ASSIGNMENT_VIEW_SELECT: &str = r#"
    SELECT a.id, a.company_id, c.code AS company_code, c.name AS company_name,
           a.server_ip_id, s.ip_address, s.port,
           a.database_name, a.db_username,
           (a.encrypted_password <> '') AS has_password,
           a.is_active, a.assigned_by, a.created_at, a.updated_at
    FROM database_assignments a
    JOIN sync_companies c ON c.id = a.company_id
    JOIN server_ips s ON s.id = a.server_ip_id
"#;

/// Fields of an assignment insert. The password must already be sealed.
#[derive(Debug, Clone)]
pub struct NewAssignment<'a> {
    pub company_id: Uuid,
    pub server_ip_id: Uuid,
    pub database_name: &'a str,
    pub db_username: &'a str,
    pub encrypted_password: &'a str,
    pub is_active: bool,
    pub assigned_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges<'a> {
    pub server_ip_id: Option<Uuid>,
    pub database_name: Option<&'a str>,
    pub db_username: Option<&'a str>,
    pub encrypted_password: Option<&'a str>,
    pub is_active: Option<bool>,
    pub assigned_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter<'a> {
    pub search: Option<&'a str>,
    pub is_active: Option<bool>,
    pub company_id: Option<Uuid>,
    pub server_ip_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct DatabaseAssignmentRepository {
    pool: PgPool,
}

impl DatabaseAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        assignment: NewAssignment<'_>,
    ) -> Result<DatabaseAssignmentEntity, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::insert(&mut *conn, assignment).await
    }

    /// Insert on an existing connection or transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        assignment: NewAssignment<'_>,
    ) -> Result<DatabaseAssignmentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_database_assignment");
        let result = sqlx::query_as::<_, DatabaseAssignmentEntity>(&format!(
            r#"
            INSERT INTO database_assignments
                (company_id, server_ip_id, database_name, db_username, encrypted_password,
                 is_active, assigned_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(assignment.company_id)
        .bind(assignment.server_ip_id)
        .bind(assignment.database_name)
        .bind(assignment.db_username)
        .bind(assignment.encrypted_password)
        .bind(assignment.is_active)
        .bind(assignment.assigned_by)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DatabaseAssignmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_database_assignment_by_id");
        let result = sqlx::query_as::<_, DatabaseAssignmentEntity>(&format!(
            "SELECT {} FROM database_assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
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
    ) -> Result<Option<DatabaseAssignmentViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_database_assignment_view");
        let result = sqlx::query_as::<_, DatabaseAssignmentViewEntity>(&format!(
            "{} WHERE a.id = $1",
            ASSIGNMENT_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// The company's active assignment, if any.
    pub async fn find_active_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Option<DatabaseAssignmentEntity>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::active_for_company(&mut *conn, company_id).await
    }

    pub async fn active_for_company(
        conn: &mut PgConnection,
        company_id: Uuid,
    ) -> Result<Option<DatabaseAssignmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_database_assignment");
        let result = sqlx::query_as::<_, DatabaseAssignmentEntity>(&format!(
            "SELECT {} FROM database_assignments WHERE company_id = $1 AND is_active",
            ASSIGNMENT_COLUMNS
        ))
        .bind(company_id)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: AssignmentChanges<'_>,
    ) -> Result<Option<DatabaseAssignmentEntity>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::apply_changes(&mut *conn, id, changes).await
    }

    /// Partial update on an existing connection or transaction.
    pub async fn apply_changes(
        conn: &mut PgConnection,
        id: Uuid,
        changes: AssignmentChanges<'_>,
    ) -> Result<Option<DatabaseAssignmentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_database_assignment");
        let result = sqlx::query_as::<_, DatabaseAssignmentEntity>(&format!(
            r#"
            UPDATE database_assignments
            SET server_ip_id = COALESCE($2, server_ip_id),
                database_name = COALESCE($3, database_name),
                db_username = COALESCE($4, db_username),
                encrypted_password = COALESCE($5, encrypted_password),
                is_active = COALESCE($6, is_active),
                assigned_by = COALESCE($7, assigned_by),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .bind(changes.server_ip_id)
        .bind(changes.database_name)
        .bind(changes.db_username)
        .bind(changes.encrypted_password)
        .bind(changes.is_active)
        .bind(changes.assigned_by)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "database_assignments", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "database_assignments", id).await
    }

    pub async fn list(
        &self,
        filter: &AssignmentFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DatabaseAssignmentViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_database_assignments");
        let result = sqlx::query_as::<_, DatabaseAssignmentViewEntity>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR c.code ILIKE $1 OR c.name ILIKE $1
                   OR a.database_name ILIKE $1 OR s.ip_address ILIKE $1)
              AND ($2::bool IS NULL OR a.is_active = $2)
              AND ($3::uuid IS NULL OR a.company_id = $3)
              AND ($4::uuid IS NULL OR a.server_ip_id = $4)
            ORDER BY c.code, a.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            ASSIGNMENT_VIEW_SELECT
        ))
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.company_id)
        .bind(filter.server_ip_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: &AssignmentFilter<'_>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_database_assignments");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM database_assignments a
            JOIN sync_companies c ON c.id = a.company_id
            JOIN server_ips s ON s.id = a.server_ip_id
            WHERE ($1::text IS NULL OR c.code ILIKE $1 OR c.name ILIKE $1
                   OR a.database_name ILIKE $1 OR s.ip_address ILIKE $1)
              AND ($2::bool IS NULL OR a.is_active = $2)
              AND ($3::uuid IS NULL OR a.company_id = $3)
              AND ($4::uuid IS NULL OR a.server_ip_id = $4)
            "#,
        )
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.company_id)
        .bind(filter.server_ip_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
