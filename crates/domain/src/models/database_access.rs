//! Grants allowing a user to run syncs against a company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseAccess {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub granted_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grant joined with user and company names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseAccessView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_display_name: String,
    pub company_id: Uuid,
    pub company_code: String,
    pub company_name: String,
    pub granted_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateDatabaseAccessRequest {
    pub user_id: Uuid,
    pub company_id: Uuid,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateDatabaseAccessRequest {
    pub company_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// Grant listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListDatabaseAccessQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub user_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

impl ListDatabaseAccessQuery {
    pub fn page_request(&self) -> shared::pagination::PageRequest {
        shared::pagination::PageRequest::new(self.page, self.per_page)
    }
}

/// A company the current user may sync, as shown on `/my-access`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MyAccessItem {
    pub access_id: Uuid,
    pub company_id: Uuid,
    pub company_code: String,
    pub company_name: String,
    pub has_database: bool,
    pub granted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults_active() {
        let req: CreateDatabaseAccessRequest = serde_json::from_str(&format!(
            r#"{{"user_id":"{}","company_id":"{}"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        ))
        .unwrap();
        assert!(req.is_active);
    }
}
