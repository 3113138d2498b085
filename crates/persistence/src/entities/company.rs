//! Company entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the sync_companies table.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyEntity {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyEntity> for domain::models::Company {
    fn from(entity: CompanyEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            name: entity.name,
            address: entity.address,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
