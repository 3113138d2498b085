//! Access requests: a user asks to use a tool against a company's database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_sql_identifier;

use super::request_status::RequestStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub status: RequestStatus,
    pub remarks: Option<String>,
    pub admin_note: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyRequest {
    /// Only the requester may cancel, and only before an admin acts.
    pub fn can_be_cancelled_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id && self.status.can_transition_to(RequestStatus::Cancelled)
    }
}

/// Request joined with display names for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompanyRequestView {
    #[serde(flatten)]
    pub request: CompanyRequest,
    pub status_label: String,
    pub user_email: String,
    pub company_code: String,
    pub company_name: String,
    pub tool_code: String,
    pub tool_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCompanyRequestRequest {
    pub company_id: Uuid,
    pub tool_id: Uuid,
    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

/// Credentials an admin supplies on approval when the company has no active
/// database assignment yet.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ProvisionCredentials {
    pub server_ip_id: Uuid,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub database_name: String,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub db_username: String,
    #[validate(length(min = 1, max = 256, message = "Password must be 1-256 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ApproveCompanyRequestRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub admin_note: Option<String>,
    #[validate(nested)]
    pub credentials: Option<ProvisionCredentials>,
}

/// Admin rejection of an access or sync request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RejectRequest {
    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub admin_note: Option<String>,
}

/// Filters for request listings, shared by access and sync requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRequestsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<RequestStatus>,
    pub company_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl ListRequestsQuery {
    pub fn page_request(&self) -> shared::pagination::PageRequest {
        shared::pagination::PageRequest::new(self.page, self.per_page)
    }
}
