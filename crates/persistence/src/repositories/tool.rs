//! Tool repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ToolEntity;
use crate::metrics::QueryTimer;

use super::like_pattern;

const TOOL_COLUMNS: &str = "id, code, name, description, is_active, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ToolChanges<'a> {
    pub code: Option<&'a str>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct ToolRepository {
    pool: PgPool,
}

impl ToolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        code: &str,
        name: &str,
        description: Option<&str>,
        is_active: bool,
    ) -> Result<ToolEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_tool");
        let result = sqlx::query_as::<_, ToolEntity>(&format!(
            r#"
            INSERT INTO tools (code, name, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TOOL_COLUMNS
        ))
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_tool_by_id");
        let result = sqlx::query_as::<_, ToolEntity>(&format!(
            "SELECT {} FROM tools WHERE id = $1",
            TOOL_COLUMNS
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
        changes: ToolChanges<'_>,
    ) -> Result<Option<ToolEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_tool");
        let result = sqlx::query_as::<_, ToolEntity>(&format!(
            r#"
            UPDATE tools
            SET code = COALESCE($2, code),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TOOL_COLUMNS
        ))
        .bind(id)
        .bind(changes.code)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "tools", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "tools", id).await
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ToolEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_tools");
        let result = sqlx::query_as::<_, ToolEntity>(&format!(
            r#"
            SELECT {}
            FROM tools
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
            ORDER BY name, id
            LIMIT $3 OFFSET $4
            "#,
            TOOL_COLUMNS
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
        let timer = QueryTimer::new("count_tools");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM tools
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
