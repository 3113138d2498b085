//! Server IP repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ServerIpEntity;
use crate::metrics::QueryTimer;

use super::like_pattern;

const SERVER_IP_COLUMNS: &str =
    "id, ip_address, port, description, is_active, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ServerIpChanges<'a> {
    pub ip_address: Option<&'a str>,
    pub port: Option<i32>,
    pub description: Option<&'a str>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct ServerIpRepository {
    pool: PgPool,
}

impl ServerIpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        ip_address: &str,
        port: i32,
        description: Option<&str>,
        is_active: bool,
    ) -> Result<ServerIpEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_server_ip");
        let result = sqlx::query_as::<_, ServerIpEntity>(&format!(
            r#"
            INSERT INTO server_ips (ip_address, port, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SERVER_IP_COLUMNS
        ))
        .bind(ip_address)
        .bind(port)
        .bind(description)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ServerIpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_server_ip_by_id");
        let result = sqlx::query_as::<_, ServerIpEntity>(&format!(
            "SELECT {} FROM server_ips WHERE id = $1",
            SERVER_IP_COLUMNS
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
        changes: ServerIpChanges<'_>,
    ) -> Result<Option<ServerIpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_server_ip");
        let result = sqlx::query_as::<_, ServerIpEntity>(&format!(
            r#"
            UPDATE server_ips
            SET ip_address = COALESCE($2, ip_address),
                port = COALESCE($3, port),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SERVER_IP_COLUMNS
        ))
        .bind(id)
        .bind(changes.ip_address)
        .bind(changes.port)
        .bind(changes.description)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn toggle_status(&self, id: Uuid) -> Result<Option<bool>, sqlx::Error> {
        super::toggle_active(&self.pool, "server_ips", id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        super::delete_by_id(&self.pool, "server_ips", id).await
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ServerIpEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_server_ips");
        let result = sqlx::query_as::<_, ServerIpEntity>(&format!(
            r#"
            SELECT {}
            FROM server_ips
            WHERE ($1::text IS NULL OR ip_address ILIKE $1 OR description ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
            ORDER BY ip_address, port
            LIMIT $3 OFFSET $4
            "#,
            SERVER_IP_COLUMNS
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
        let timer = QueryTimer::new("count_server_ips");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM server_ips
            WHERE ($1::text IS NULL OR ip_address ILIKE $1 OR description ILIKE $1)
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
