//! User and login session entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::UserRole;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            display_name: entity.display_name,
            // Unknown roles never get admin rights.
            role: entity.role.parse().unwrap_or(UserRole::User),
            is_active: entity.is_active,
            last_login_at: entity.last_login_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the login_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct LoginSessionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_jti: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<LoginSessionEntity> for domain::models::user::LoginSession {
    fn from(entity: LoginSessionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            token_jti: entity.token_jti,
            user_agent: entity.user_agent,
            ip_address: entity.ip_address,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            revoked_at: entity.revoked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_maps_to_user() {
        let now = Utc::now();
        let entity = UserEntity {
            id: Uuid::new_v4(),
            email: "x@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: "X".to_string(),
            role: "superuser".to_string(),
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let user: domain::models::User = entity.into();
        assert_eq!(user.role, UserRole::User);
    }
}
