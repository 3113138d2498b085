//! Attendance synchronization jobs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::request_status::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub admin_note: Option<String>,
    /// Identity of the mirrored row in the company database.
    pub external_ref: Option<i64>,
    pub last_error: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncRequest {
    pub fn can_be_cancelled_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id && self.status.can_transition_to(RequestStatus::Cancelled)
    }

    /// Whether a status poll should consult the external row.
    pub fn awaits_external_result(&self) -> bool {
        self.status == RequestStatus::InProgress && self.external_ref.is_some()
    }

    pub fn status_response(&self) -> SyncStatusResponse {
        SyncStatusResponse {
            id: self.id,
            status: self.status,
            status_label: self.status.label().to_string(),
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            last_error: self.last_error.clone(),
        }
    }
}

/// Sync request joined with display names for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncRequestView {
    #[serde(flatten)]
    pub request: SyncRequest,
    pub status_label: String,
    pub user_email: String,
    pub company_code: String,
    pub company_name: String,
    pub tool_code: String,
    pub tool_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateSyncRequestRequest {
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[validate(length(max = 500, message = "Remarks must be at most 500 characters"))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CompleteSyncRequestRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub admin_note: Option<String>,
}

/// Polling payload for `GET /sync-requests/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncStatusResponse {
    pub id: Uuid,
    pub status: RequestStatus,
    pub status_label: String,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync(status: RequestStatus, external_ref: Option<i64>) -> SyncRequest {
        let now = Utc::now();
        SyncRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            tool_id: Uuid::new_v4(),
            from_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            status,
            remarks: None,
            admin_note: None,
            external_ref,
            last_error: None,
            processed_by: None,
            processed_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_awaits_external_result() {
        assert!(sync(RequestStatus::InProgress, Some(7)).awaits_external_result());
        assert!(!sync(RequestStatus::InProgress, None).awaits_external_result());
        assert!(!sync(RequestStatus::New, Some(7)).awaits_external_result());
    }

    #[test]
    fn test_status_response_carries_label() {
        let response = sync(RequestStatus::InProgress, Some(1)).status_response();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "IP");
        assert_eq!(json["status_label"], "In Progress");
    }

    #[test]
    fn test_only_owner_cancels_new() {
        let request = sync(RequestStatus::New, None);
        assert!(request.can_be_cancelled_by(request.user_id));
        assert!(!request.can_be_cancelled_by(Uuid::new_v4()));
        let dispatched = sync(RequestStatus::InProgress, Some(3));
        assert!(!dispatched.can_be_cancelled_by(dispatched.user_id));
    }

    #[test]
    fn test_create_parses_iso_dates() {
        let req: CreateSyncRequestRequest = serde_json::from_str(&format!(
            r#"{{"company_id":"{}","tool_id":"{}","from_date":"2024-01-01","to_date":"2024-01-15"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(req.from_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
