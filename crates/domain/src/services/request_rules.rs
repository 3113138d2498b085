//! Business rules for access and sync requests that do not need storage.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::RequestStatus;

/// A sync date range the portal will not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncWindowError {
    #[error("from_date must be on or before to_date")]
    Inverted,

    #[error("Date range spans {days} days, the maximum is {max}")]
    TooLong { days: i64, max: u32 },
}

impl SyncWindowError {
    /// Request field the error is reported against.
    pub fn field(&self) -> &'static str {
        match self {
            SyncWindowError::Inverted => "from_date",
            SyncWindowError::TooLong { .. } => "to_date",
        }
    }
}

/// Checks `from <= to` and that the inclusive span is at most `max_days`.
pub fn validate_sync_window(
    from: NaiveDate,
    to: NaiveDate,
    max_days: u32,
) -> Result<(), SyncWindowError> {
    if from > to {
        return Err(SyncWindowError::Inverted);
    }
    let days = (to - from).num_days() + 1;
    if days > max_days as i64 {
        return Err(SyncWindowError::TooLong {
            days,
            max: max_days,
        });
    }
    Ok(())
}

/// What approving an access request does to the company's credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    /// The company already has an active assignment and none was supplied.
    KeepExisting,
    /// No active assignment: create one from the supplied credentials.
    Create,
    /// Supplied credentials replace the active assignment.
    Replace,
}

/// Approval needs credentials when the company has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Company has no active database assignment; credentials are required to approve")]
pub struct MissingCredentials;

pub fn plan_provisioning(
    has_active_assignment: bool,
    credentials_supplied: bool,
) -> Result<ProvisionAction, MissingCredentials> {
    match (has_active_assignment, credentials_supplied) {
        (false, false) => Err(MissingCredentials),
        (false, true) => Ok(ProvisionAction::Create),
        (true, false) => Ok(ProvisionAction::KeepExisting),
        (true, true) => Ok(ProvisionAction::Replace),
    }
}

/// Local change implied by the mirrored row's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Complete,
    Fail(String),
}

/// Decides how an in-progress sync request follows its external row.
///
/// Only `IP` requests move; the external job reports `CP` or `RR`, anything
/// else (including unknown codes) leaves the local row alone.
pub fn reconcile_external_status(
    local: RequestStatus,
    external_code: &str,
    external_remarks: Option<&str>,
) -> Reconciliation {
    if local != RequestStatus::InProgress {
        return Reconciliation::Unchanged;
    }
    match external_code.parse::<RequestStatus>() {
        Ok(RequestStatus::Completed) => Reconciliation::Complete,
        Ok(RequestStatus::Rejected) => Reconciliation::Fail(
            external_remarks
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("Rejected by the company sync job")
                .to_string(),
        ),
        _ => Reconciliation::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_window_is_valid() {
        assert!(validate_sync_window(date(2024, 5, 1), date(2024, 5, 1), 31).is_ok());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = validate_sync_window(date(2024, 5, 2), date(2024, 5, 1), 31).unwrap_err();
        assert_eq!(err, SyncWindowError::Inverted);
        assert_eq!(err.field(), "from_date");
    }

    #[test]
    fn test_window_limit_is_inclusive() {
        assert!(validate_sync_window(date(2024, 1, 1), date(2024, 1, 31), 31).is_ok());
        let err = validate_sync_window(date(2024, 1, 1), date(2024, 2, 1), 31).unwrap_err();
        assert_eq!(err, SyncWindowError::TooLong { days: 32, max: 31 });
    }

    #[test]
    fn test_plan_provisioning() {
        assert_eq!(plan_provisioning(false, false), Err(MissingCredentials));
        assert_eq!(plan_provisioning(false, true), Ok(ProvisionAction::Create));
        assert_eq!(plan_provisioning(true, false), Ok(ProvisionAction::KeepExisting));
        assert_eq!(plan_provisioning(true, true), Ok(ProvisionAction::Replace));
    }

    #[test]
    fn test_reconcile_completed() {
        assert_eq!(
            reconcile_external_status(RequestStatus::InProgress, "CP", None),
            Reconciliation::Complete
        );
    }

    #[test]
    fn test_reconcile_rejected_uses_remarks() {
        assert_eq!(
            reconcile_external_status(RequestStatus::InProgress, "RR", Some("Device offline")),
            Reconciliation::Fail("Device offline".to_string())
        );
        assert_eq!(
            reconcile_external_status(RequestStatus::InProgress, "RR", Some("  ")),
            Reconciliation::Fail("Rejected by the company sync job".to_string())
        );
    }

    #[test]
    fn test_reconcile_ignores_other_codes() {
        assert_eq!(
            reconcile_external_status(RequestStatus::InProgress, "IP", None),
            Reconciliation::Unchanged
        );
        assert_eq!(
            reconcile_external_status(RequestStatus::InProgress, "??", None),
            Reconciliation::Unchanged
        );
        assert_eq!(
            reconcile_external_status(RequestStatus::Completed, "RR", Some("late")),
            Reconciliation::Unchanged
        );
    }
}
