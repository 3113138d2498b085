//! Per-company external database credentials.
//!
//! The password is stored sealed by `shared::crypto::CredentialCipher` and is
//! never part of an API response; views expose `has_password` instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_sql_identifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseAssignment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub server_ip_id: Uuid,
    pub database_name: String,
    pub db_username: String,
    #[serde(skip_serializing)]
    pub encrypted_password: String,
    pub is_active: bool,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assignment joined with its company and server, safe to return to admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseAssignmentView {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_code: String,
    pub company_name: String,
    pub server_ip_id: Uuid,
    pub ip_address: String,
    pub port: i32,
    pub database_name: String,
    pub db_username: String,
    pub has_password: bool,
    pub is_active: bool,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateDatabaseAssignmentRequest {
    pub company_id: Uuid,
    pub server_ip_id: Uuid,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub database_name: String,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub db_username: String,
    #[validate(length(min = 1, max = 256, message = "Password must be 1-256 characters"))]
    pub password: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; a non-empty `password` is re-encrypted.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateDatabaseAssignmentRequest {
    pub server_ip_id: Option<Uuid>,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub database_name: Option<String>,
    #[validate(custom(function = "validate_sql_identifier"))]
    pub db_username: Option<String>,
    #[validate(length(max = 256, message = "Password must be at most 256 characters"))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

/// Assignment listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListDatabaseAssignmentsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub company_id: Option<Uuid>,
    pub server_ip_id: Option<Uuid>,
}

impl ListDatabaseAssignmentsQuery {
    pub fn page_request(&self) -> shared::pagination::PageRequest {
        shared::pagination::PageRequest::new(self.page, self.per_page)
    }
}

/// Outcome of a connectivity check against the external server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionTestResponse {
    pub assignment_id: Uuid,
    pub reachable: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypted_password_not_serialized() {
        let now = Utc::now();
        let assignment = DatabaseAssignment {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            server_ip_id: Uuid::new_v4(),
            database_name: "HRM_Acme".to_string(),
            db_username: "sync_user".to_string(),
            encrypted_password: "pbkdf2-aes256gcm$100000$AAAA".to_string(),
            is_active: true,
            assigned_by: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&assignment).unwrap();
        assert!(!json.contains("encrypted_password"));
        assert!(!json.contains("pbkdf2"));
    }

    #[test]
    fn test_create_validation_rejects_injection_in_identifiers() {
        let req = CreateDatabaseAssignmentRequest {
            company_id: Uuid::new_v4(),
            server_ip_id: Uuid::new_v4(),
            database_name: "HRM;DROP TABLE x".to_string(),
            db_username: "sync_user".to_string(),
            password: "p@ss".to_string(),
            is_active: true,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("database_name"));
    }

    #[test]
    fn test_create_requires_password() {
        let req = CreateDatabaseAssignmentRequest {
            company_id: Uuid::new_v4(),
            server_ip_id: Uuid::new_v4(),
            database_name: "HRM_Acme".to_string(),
            db_username: "sync_user".to_string(),
            password: String::new(),
            is_active: true,
        };
        assert!(req.validate().is_err());
    }
}
