//! Server IP entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the server_ips table.
#[derive(Debug, Clone, FromRow)]
pub struct ServerIpEntity {
    pub id: Uuid,
    pub ip_address: String,
    pub port: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServerIpEntity> for domain::models::ServerIp {
    fn from(entity: ServerIpEntity) -> Self {
        Self {
            id: entity.id,
            ip_address: entity.ip_address,
            port: entity.port,
            description: entity.description,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
