//! Rows of the `AttandanceSynchronization` table in a company database.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::request_status::RequestStatus;

/// Row to insert when a sync request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExternalSyncRow {
    pub request_id: Uuid,
    pub tool_code: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: RequestStatus,
    pub remarks: Option<String>,
}

/// Row as read back from the company database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExternalSyncRow {
    pub id: i64,
    pub request_id: Uuid,
    pub tool_code: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// Raw status code; companies' jobs may write codes this portal does not know.
    pub status: String,
    pub remarks: Option<String>,
    pub created_date: NaiveDateTime,
    pub updated_date: Option<NaiveDateTime>,
}

impl ExternalSyncRow {
    /// Parsed status, `None` for unknown codes.
    pub fn parsed_status(&self) -> Option<RequestStatus> {
        self.status.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> ExternalSyncRow {
        ExternalSyncRow {
            id: 1,
            request_id: Uuid::new_v4(),
            tool_code: "ZK".to_string(),
            from_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            status: status.to_string(),
            remarks: None,
            created_date: NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            updated_date: None,
        }
    }

    #[test]
    fn test_parsed_status() {
        assert_eq!(row("CP").parsed_status(), Some(RequestStatus::Completed));
        assert_eq!(row("cp ").parsed_status(), Some(RequestStatus::Completed));
        assert_eq!(row("ZZ").parsed_status(), None);
    }
}
