//! Database assignment entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::database_assignment::DatabaseAssignmentView;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the database_assignments table.
#[derive(Debug, Clone, FromRow)]
pub struct DatabaseAssignmentEntity {
    pub id: Uuid,
    pub company_id: Uuid,
    pub server_ip_id: Uuid,
    pub database_name: String,
    pub db_username: String,
    pub encrypted_password: String,
    pub is_active: bool,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DatabaseAssignmentEntity> for domain::models::DatabaseAssignment {
    fn from(entity: DatabaseAssignmentEntity) -> Self {
        Self {
            id: entity.id,
            company_id: entity.company_id,
            server_ip_id: entity.server_ip_id,
            database_name: entity.database_name,
            db_username: entity.db_username,
            encrypted_password: entity.encrypted_password,
            is_active: entity.is_active,
            assigned_by: entity.assigned_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Assignment joined with company and server; the sealed password is reduced
/// to a flag in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct DatabaseAssignmentViewEntity {
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

impl From<DatabaseAssignmentViewEntity> for DatabaseAssignmentView {
    fn from(entity: DatabaseAssignmentViewEntity) -> Self {
        Self {
            id: entity.id,
            company_id: entity.company_id,
            company_code: entity.company_code,
            company_name: entity.company_name,
            server_ip_id: entity.server_ip_id,
            ip_address: entity.ip_address,
            port: entity.port,
            database_name: entity.database_name,
            db_username: entity.db_username,
            has_password: entity.has_password,
            is_active: entity.is_active,
            assigned_by: entity.assigned_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
