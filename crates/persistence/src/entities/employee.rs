//! Employee entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::employee::EmployeeView;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the employees table.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeEntity {
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

impl From<EmployeeEntity> for domain::models::Employee {
    fn from(entity: EmployeeEntity) -> Self {
        Self {
            id: entity.id,
            company_id: entity.company_id,
            employee_code: entity.employee_code,
            full_name: entity.full_name,
            designation: entity.designation,
            card_no: entity.card_no,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Employee row joined with its company.
#[derive(Debug, Clone, FromRow)]
pub struct EmployeeViewEntity {
    #[sqlx(flatten)]
    pub employee: EmployeeEntity,
    pub company_code: String,
    pub company_name: String,
}

impl From<EmployeeViewEntity> for EmployeeView {
    fn from(entity: EmployeeViewEntity) -> Self {
        Self {
            employee: entity.employee.into(),
            company_code: entity.company_code,
            company_name: entity.company_name,
        }
    }
}
