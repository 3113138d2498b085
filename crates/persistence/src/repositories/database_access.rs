//! Database access grant repository.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{DatabaseAccessEntity, DatabaseAccessViewEntity, MyAccessEntity};
use crate::metrics::QueryTimer;

use super::like_pattern;

const ACCESS_COLUMNS: &str =
    "id, user_id, company_id, granted_by, is_active, created_at, updated_at";

const ACCESS_VIEW_SELECT: &str = r#"
    SELECT g.id, g.user_id, u.email AS user_email, u.display_name AS user_display_name,
           g.company_id, c.code AS company_code, c.name AS company_name,
           g.granted_by, g.is_active, g.created_at, g.updated_at
    FROM database_access g
    JOIN users u ON u.id = g.user_id
    JOIN sync_companies c ON c.id = g.company_id
"#;

#[derive(Debug, Clone, Default)]
pub struct AccessFilter<'a> {
    pub search: Option<&'a str>,
    pub is_active: Option<bool>,
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct DatabaseAccessRepository {
    pool: PgPool,
}

impl DatabaseAccessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        company_id: Uuid,
        granted_by: Option<Uuid>,
        is_active: bool,
    ) -> Result<DatabaseAccessEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_database_access");
        let result = sqlx::query_as::<_, DatabaseAccessEntity>(&format!(
            r#"
            INSERT INTO database_access (user_id, company_id, granted_by, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ACCESS_COLUMNS
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(granted_by)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create the grant or re-activate an existing one.
    pub async fn upsert_active(
        conn: &mut PgConnection,
        user_id: Uuid,
        company_id: Uuid,
        granted_by: Uuid,
    ) -> Result<DatabaseAccessEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_database_access");
        let result = sqlx::query_as::<_, DatabaseAccessEntity>(&format!(
            r#"
            INSERT INTO database_access (user_id, company_id, granted_by, is_active)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (user_id, company_id)
            DO UPDATE SET is_active = TRUE, granted_by = EXCLUDED.granted_by, updated_at = NOW()
            RETURNING {}
            "#,
            ACCESS_COLUMNS
        ))
        .bind(user_id)
        .bind(company_id)
        .bind(granted_by)
        .fetch_one(conn)
        .await;
        timer.record();
        result
    }

    pub async fn find_view_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<DatabaseAccessViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_database_access_by_id");
        let result = sqlx::query_as::<_, DatabaseAccessViewEntity>(&format!(
            "{} WHERE g.id = $1",
            ACCESS_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// True when the user holds an active grant for an active company.
    pub async fn has_active_grant(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_active_database_access");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM database_access g
                JOIN sync_companies c ON c.id = g.company_id
                WHERE g.user_id = $1 AND g.company_id = $2 AND g.is_active AND c.is_active
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

    pub async fn update(
        &self,
        id: Uuid,
        company_id: Option<Uuid>,
        is_active: Option<bool>,
    ) -> Result<Option<DatabaseAccessEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_database_access");
        let result = sqlx::query_as::<_, DatabaseAccessEntity>(&format!(
            r#"
            UPDATE database_access
            SET company_id = COALESCE($2, company_id),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCESS_COLUMNS
        ))
        .bind(id)
        .bind(company_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "database_access", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "database_access", id).await
    }

    pub async fn list(
        &self,
        filter: &AccessFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DatabaseAccessViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_database_access");
        let result = sqlx::query_as::<_, DatabaseAccessViewEntity>(&format!(
            r#"
            {}
            WHERE ($1::text IS NULL OR u.email ILIKE $1 OR u.display_name ILIKE $1
                   OR c.code ILIKE $1 OR c.name ILIKE $1)
              AND ($2::bool IS NULL OR g.is_active = $2)
              AND ($3::uuid IS NULL OR g.user_id = $3)
              AND ($4::uuid IS NULL OR g.company_id = $4)
            ORDER BY g.created_at DESC, g.id
            LIMIT $5 OFFSET $6
            "#,
            ACCESS_VIEW_SELECT
        ))
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.user_id)
        .bind(filter.company_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: &AccessFilter<'_>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_database_access");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM database_access g
            JOIN users u ON u.id = g.user_id
            JOIN sync_companies c ON c.id = g.company_id
            WHERE ($1::text IS NULL OR u.email ILIKE $1 OR u.display_name ILIKE $1
                   OR c.code ILIKE $1 OR c.name ILIKE $1)
              AND ($2::bool IS NULL OR g.is_active = $2)
              AND ($3::uuid IS NULL OR g.user_id = $3)
              AND ($4::uuid IS NULL OR g.company_id = $4)
            "#,
        )
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.user_id)
        .bind(filter.company_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active companies the user holds an active grant for.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MyAccessEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_my_access");
        let result = sqlx::query_as::<_, MyAccessEntity>(
            r#"
            SELECT g.id AS access_id, c.id AS company_id, c.code AS company_code,
                   c.name AS company_name,
                   EXISTS (
                       SELECT 1 FROM database_assignments a
                       WHERE a.company_id = c.id AND a.is_active
                   ) AS has_database,
                   g.updated_at AS granted_at
            FROM database_access g
            JOIN sync_companies c ON c.id = g.company_id
            WHERE g.user_id = $1 AND g.is_active AND c.is_active
            ORDER BY c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
