//! Companies whose attendance databases can be synchronized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::{validate_code, validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Company {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company codes are stored uppercase.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCompanyRequest {
    #[validate(custom(function = "validate_code"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateCompanyRequest {
    #[validate(custom(function = "validate_code"))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Address must be at most 500 characters"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> CreateCompanyRequest {
        CreateCompanyRequest {
            code: "ACME".to_string(),
            name: name.to_string(),
            address: None,
            is_active: true,
        }
    }

    #[test]
    fn test_blank_name_fails_validation() {
        let errors = create("   ").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(create("").validate().is_err());
    }

    #[test]
    fn test_valid_company() {
        assert!(create("Acme Garments Ltd").validate().is_ok());
    }

    #[test]
    fn test_generated_company_names_are_valid() {
        use fake::{faker::company::en::CompanyName, Fake};

        for _ in 0..20 {
            let name: String = CompanyName().fake();
            assert!(create(&name).validate().is_ok(), "rejected {}", name);
        }
    }

    #[test]
    fn test_bad_code_fails_validation() {
        let mut req = create("Acme");
        req.code = "A CME!".to_string();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }

    #[test]
    fn test_update_is_partial() {
        assert!(UpdateCompanyRequest::default().validate().is_ok());
        let update = UpdateCompanyRequest {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" acme-01 "), "ACME-01");
    }

    #[test]
    fn test_is_active_defaults_to_true() {
        let req: CreateCompanyRequest =
            serde_json::from_str(r#"{"code":"ACME","name":"Acme"}"#).unwrap();
        assert!(req.is_active);
    }
}
