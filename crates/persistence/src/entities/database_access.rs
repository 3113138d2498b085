//! Database access grant entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::database_access::{DatabaseAccessView, MyAccessItem};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the database_access table.
#[derive(Debug, Clone, FromRow)]
pub struct DatabaseAccessEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub granted_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DatabaseAccessEntity> for domain::models::DatabaseAccess {
    fn from(entity: DatabaseAccessEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            company_id: entity.company_id,
            granted_by: entity.granted_by,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DatabaseAccessViewEntity {
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

impl From<DatabaseAccessViewEntity> for DatabaseAccessView {
    fn from(entity: DatabaseAccessViewEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            user_email: entity.user_email,
            user_display_name: entity.user_display_name,
            company_id: entity.company_id,
            company_code: entity.company_code,
            company_name: entity.company_name,
            granted_by: entity.granted_by,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Row behind `/my-access`.
#[derive(Debug, Clone, FromRow)]
pub struct MyAccessEntity {
    pub access_id: Uuid,
    pub company_id: Uuid,
    pub company_code: String,
    pub company_name: String,
    pub has_database: bool,
    pub granted_at: DateTime<Utc>,
}

impl From<MyAccessEntity> for MyAccessItem {
    fn from(entity: MyAccessEntity) -> Self {
        Self {
            access_id: entity.access_id,
            company_id: entity.company_id,
            company_code: entity.company_code,
            company_name: entity.company_name,
            has_database: entity.has_database,
            granted_at: entity.granted_at,
        }
    }
}
