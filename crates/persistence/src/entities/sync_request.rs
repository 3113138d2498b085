//! Sync request entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::sync_request::SyncRequestView;
use sqlx::FromRow;
use uuid::Uuid;

use super::status_from_db;

/// Database row mapping for the sync_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct SyncRequestEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub tool_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: String,
    pub remarks: Option<String>,
    pub admin_note: Option<String>,
    pub external_ref: Option<i64>,
    pub last_error: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SyncRequestEntity> for domain::models::SyncRequest {
    fn from(entity: SyncRequestEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            company_id: entity.company_id,
            tool_id: entity.tool_id,
            from_date: entity.from_date,
            to_date: entity.to_date,
            status: status_from_db(&entity.status),
            remarks: entity.remarks,
            admin_note: entity.admin_note,
            external_ref: entity.external_ref,
            last_error: entity.last_error,
            processed_by: entity.processed_by,
            processed_at: entity.processed_at,
            completed_at: entity.completed_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Sync request joined with user, company and tool.
#[derive(Debug, Clone, FromRow)]
pub struct SyncRequestViewEntity {
    #[sqlx(flatten)]
    pub request: SyncRequestEntity,
    pub user_email: String,
    pub company_code: String,
    pub company_name: String,
    pub tool_code: String,
    pub tool_name: String,
}

impl From<SyncRequestViewEntity> for SyncRequestView {
    fn from(entity: SyncRequestViewEntity) -> Self {
        let request: domain::models::SyncRequest = entity.request.into();
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
