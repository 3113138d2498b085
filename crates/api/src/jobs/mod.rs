//! Background job scheduler and job implementations.

mod pool_metrics;
mod scheduler;
mod session_cleanup;
mod sync_reconcile;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
pub use sync_reconcile::SyncReconcileJob;

use crate::app::AppState;

/// Registers the housekeeping jobs enabled in the configuration.
pub fn build_scheduler(state: &AppState) -> JobScheduler {
    let jobs = &state.config.jobs;
    let mut scheduler = JobScheduler::new();

    scheduler.register(PoolMetricsJob::new(state.pool.clone()));
    if jobs.session_cleanup_interval_secs > 0 {
        scheduler.register(SessionCleanupJob::new(
            state.pool.clone(),
            state.login_limiter.clone(),
            jobs.session_cleanup_interval_secs,
        ));
    }
    if jobs.sync_poll_interval_secs > 0 {
        scheduler.register(SyncReconcileJob::new(
            state.clone(),
            jobs.sync_poll_interval_secs,
            jobs.sync_poll_batch_size,
        ));
    }
    scheduler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::lazy_state;

    #[tokio::test]
    async fn test_zero_intervals_leave_only_pool_metrics() {
        let scheduler = build_scheduler(&lazy_state(&[]));
        assert_eq!(scheduler.job_names(), vec!["pool_metrics"]);
    }

    #[tokio::test]
    async fn test_enabled_intervals_register_jobs() {
        let scheduler = build_scheduler(&lazy_state(&[
            ("jobs.session_cleanup_interval_secs", "3600"),
            ("jobs.sync_poll_interval_secs", "60"),
        ]));
        assert_eq!(
            scheduler.job_names(),
            vec!["pool_metrics", "session_cleanup", "sync_reconcile"]
        );
    }
}
