//! Company repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CompanyEntity;
use crate::metrics::QueryTimer;

use super::like_pattern;

const COMPANY_COLUMNS: &str = "id, code, name, address, is_active, created_at, updated_at";

/// Partial company update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CompanyChanges<'a> {
    pub code: Option<&'a str>,
    pub name: Option<&'a str>,
    pub address: Option<&'a str>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        code: &str,
        name: &str,
        address: Option<&str>,
        is_active: bool,
    ) -> Result<CompanyEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_company");
        let result = sqlx::query_as::<_, CompanyEntity>(&format!(
            r#"
            INSERT INTO sync_companies (code, name, address, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(code)
        .bind(name)
        .bind(address)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CompanyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_company_by_id");
        let result = sqlx::query_as::<_, CompanyEntity>(&format!(
            "SELECT {} FROM sync_companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: CompanyChanges<'_>,
    ) -> Result<Option<CompanyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_company");
        let result = sqlx::query_as::<_, CompanyEntity>(&format!(
            r#"
            UPDATE sync_companies
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                address = COALESCE($4, address),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(id)
        .bind(changes.code)
        .bind(changes.name)
        .bind(changes.address)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "sync_companies", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "sync_companies", id).await
    }

    /// Page of companies matching code/name search and status.
    pub async fn list(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CompanyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_companies");
        let result = sqlx::query_as::<_, CompanyEntity>(&format!(
            r#"
            SELECT {}
            FROM sync_companies
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "#,
            COMPANY_COLUMNS
        ))
        .bind(like_pattern(search))
        .bind(is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_companies");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM sync_companies
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
            "#,
        )
        .bind(like_pattern(search))
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
