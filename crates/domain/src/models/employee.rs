//! Employees registered under a company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_code, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub employee_code: String,
    pub full_name: String,
    pub designation: Option<String>,
    pub card_no: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee with the owning company's code and name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    pub company_code: String,
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEmployeeRequest {
    pub company_id: Uuid,
    #[validate(custom(function = "validate_code"))]
    pub employee_code: String,
    #[validate(length(min = 1, max = 200, message = "Full name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,
    #[validate(length(max = 100, message = "Designation must be at most 100 characters"))]
    pub designation: Option<String>,
    #[validate(length(max = 50, message = "Card number must be at most 50 characters"))]
    pub card_no: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateEmployeeRequest {
    pub company_id: Option<Uuid>,
    #[validate(custom(function = "validate_code"))]
    pub employee_code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Full name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: Option<String>,
    #[validate(length(max = 100, message = "Designation must be at most 100 characters"))]
    pub designation: Option<String>,
    #[validate(length(max = 50, message = "Card number must be at most 50 characters"))]
    pub card_no: Option<String>,
    pub is_active: Option<bool>,
}

/// Employee listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListEmployeesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub company_id: Option<Uuid>,
}

impl ListEmployeesQuery {
    pub fn page_request(&self) -> shared::pagination::PageRequest {
        shared::pagination::PageRequest::new(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_employee_validation() {
        let req = CreateEmployeeRequest {
            company_id: Uuid::new_v4(),
            employee_code: "E1001".to_string(),
            full_name: "Rahim Uddin".to_string(),
            designation: Some("Operator".to_string()),
            card_no: None,
            is_active: true,
        };
        assert!(req.validate().is_ok());

        let blank = CreateEmployeeRequest {
            full_name: " ".to_string(),
            ..req.clone()
        };
        assert!(blank.validate().is_err());

        let bad_code = CreateEmployeeRequest {
            employee_code: "E 1".to_string(),
            ..req
        };
        assert!(bad_code.validate().is_err());
    }

    #[test]
    fn test_view_flattens_employee() {
        let now = Utc::now();
        let view = EmployeeView {
            employee: Employee {
                id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                employee_code: "E1".to_string(),
                full_name: "Karim".to_string(),
                designation: None,
                card_no: Some("0042".to_string()),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            company_code: "ACME".to_string(),
            company_name: "Acme".to_string(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["employee_code"], "E1");
        assert_eq!(json["company_code"], "ACME");
    }
}
