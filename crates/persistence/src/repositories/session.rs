//! Login session repository.
//!
//! A session row backs every issued token; revoking the row logs the token out.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::LoginSessionEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        token_jti: &str,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<LoginSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_login_session");
        let result = sqlx::query_as::<_, LoginSessionEntity>(
            r#"
            INSERT INTO login_sessions (user_id, token_jti, user_agent, ip_address, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, token_jti, user_agent, ip_address, created_at, expires_at, revoked_at
            "#,
        )
        .bind(user_id)
        .bind(token_jti)
        .bind(user_agent)
        .bind(ip_address)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_jti(
        &self,
        token_jti: &str,
    ) -> Result<Option<LoginSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_login_session_by_jti");
        let result = sqlx::query_as::<_, LoginSessionEntity>(
            r#"
            SELECT id, user_id, token_jti, user_agent, ip_address, created_at, expires_at, revoked_at
            FROM login_sessions
            WHERE token_jti = $1
            "#,
        )
        .bind(token_jti)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Revoke one session. Returns false when it was already revoked or unknown.
    pub async fn revoke(&self, token_jti: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("revoke_login_session");
        let result = sqlx::query(
            "UPDATE login_sessions SET revoked_at = NOW() WHERE token_jti = $1 AND revoked_at IS NULL",
        )
        .bind(token_jti)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Revoke every open session of a user, optionally sparing one.
    pub async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        except_jti: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("revoke_user_sessions");
        let result = sqlx::query(
            r#"
            UPDATE login_sessions
            SET revoked_at = NOW()
            WHERE user_id = $1
              AND revoked_at IS NULL
              AND ($2::text IS NULL OR token_jti <> $2)
            "#,
        )
        .bind(user_id)
        .bind(except_jti)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Delete sessions that expired more than a day ago.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_login_sessions");
        let result = sqlx::query(
            "DELETE FROM login_sessions WHERE expires_at < NOW() - INTERVAL '1 day'",
        )
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
