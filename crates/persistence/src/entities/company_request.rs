//! Access request entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::company_request::CompanyRequestView;
use sqlx::FromRow;
use uuid::Uuid;

use super::status_from_db;

/// Database row mapping for the company_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRequestEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub status: String,
    pub remarks: Option<String>,
    pub admin_note: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyRequestEntity> for domain::models::CompanyRequest {
    fn from(entity: CompanyRequestEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            company_id: entity.company_id,
            tool_id: entity.tool_id,
            status: status_from_db(&entity.status),
            remarks: entity.remarks,
            admin_note: entity.admin_note,
            processed_by: entity.processed_by,
            processed_at: entity.processed_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Access request joined with user, company and tool.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyRequestViewEntity {
    #[sqlx(flatten)]
    pub request: CompanyRequestEntity,
    pub user_email: String,
    pub company_code: String,
    pub company_name: String,
    pub tool_code: String,
    pub tool_name: String,
}

impl From<CompanyRequestViewEntity> for CompanyRequestView {
    fn from(entity: CompanyRequestViewEntity) -> Self {
        let request: domain::models::CompanyRequest = entity.request.into();
        Self {
            status_label: request.status.label().to_string(),
            request,
            user_email: entity.user_email,
            company_code: entity.company_code,
            company_name: entity.company_name,
            tool_code: entity.tool_code,
            tool_name: entity.tool_name,
        }
    }
}
