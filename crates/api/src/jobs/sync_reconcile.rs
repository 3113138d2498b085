use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::app::AppState;

/// Picks up results written by sync tools for in-progress requests, so
/// requests complete even when nobody polls their status.
pub struct SyncReconcileJob {
    state: AppState,
    interval_secs: u64,
    batch_size: i64,
}

impl SyncReconcileJob {
    pub fn new(state: AppState, interval_secs: u64, batch_size: i64) -> Self {
        Self {
            state,
            interval_secs,
            batch_size,
        }
    }
}

#[async_trait::async_trait]
impl Job for SyncReconcileJob {
    fn name(&self) -> &'static str {
        "sync_reconcile"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let summary = self
            .state
            .sync_requests()
            .reconcile_pending(self.batch_size)
            .await
            .map_err(|e| format!("Sync reconcile failed: {}", e))?;

        if summary.checked > 0 {
            info!(
                checked = summary.checked,
                completed = summary.completed,
                failed = summary.failed,
                unreachable = summary.unreachable,
                "Reconciled in-progress sync requests"
            );
        }
        Ok(())
    }
}
