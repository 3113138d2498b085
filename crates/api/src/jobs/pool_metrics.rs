use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

/// Publishes Postgres pool gauges for the `/metrics` endpoint.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(15)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    #[tokio::test]
    async fn test_runs_without_open_connections() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let job = PoolMetricsJob::new(pool);

        assert_eq!(job.name(), "pool_metrics");
        assert_eq!(job.frequency().duration(), Duration::from_secs(15));
        assert!(job.execute().await.is_ok());
    }
}
