use std::sync::Arc;

use persistence::repositories::SessionRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::LoginRateLimiter;

/// Deletes long-expired login sessions and forgets idle rate limiter entries.
pub struct SessionCleanupJob {
    pool: PgPool,
    limiter: Option<Arc<LoginRateLimiter>>,
    interval_secs: u64,
}

impl SessionCleanupJob {
    pub fn new(pool: PgPool, limiter: Option<Arc<LoginRateLimiter>>, interval_secs: u64) -> Self {
        Self {
            pool,
            limiter,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let deleted = SessionRepository::new(self.pool.clone())
            .delete_expired()
            .await
            .map_err(|e| format!("Failed to delete expired sessions: {}", e))?;

        if let Some(limiter) = &self.limiter {
            limiter.prune();
        }

        if deleted > 0 {
            info!(deleted, "Removed expired login sessions");
        }
        Ok(())
    }
}
