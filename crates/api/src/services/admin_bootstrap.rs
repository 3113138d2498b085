//! Creates the first admin account at startup.

use domain::models::user::{normalize_email, validate_password_policy};
use domain::models::UserRole;
use persistence::repositories::{NewUser, UserChanges, UserRepository};
use shared::password::{hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// What [`bootstrap_admin`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    NotConfigured,
    AdminExists,
    /// An existing account with the bootstrap email was promoted.
    Promoted,
    Created,
}

/// Idempotent: does nothing when bootstrap is not configured or an active
/// admin already exists.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    if config.bootstrap_email.trim().is_empty() {
        return Ok(BootstrapOutcome::NotConfigured);
    }
    if config.bootstrap_password.is_empty() {
        warn!("ASP__ADMIN__BOOTSTRAP_EMAIL is set but the password is empty, skipping bootstrap");
        return Ok(BootstrapOutcome::NotConfigured);
    }
    validate_password_policy(&config.bootstrap_password).map_err(|e| {
        BootstrapError::Config(format!(
            "bootstrap password rejected: {}",
            e.message.unwrap_or_else(|| e.code.clone())
        ))
    })?;

    let users = UserRepository::new(pool.clone());
    if users.count_active_admins().await? > 0 {
        return Ok(BootstrapOutcome::AdminExists);
    }

    let email = normalize_email(&config.bootstrap_email);
    if let Some(existing) = users.find_by_email(&email).await? {
        users
            .update(
                existing.id,
                UserChanges {
                    role: Some(UserRole::Admin.as_str()),
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %existing.id, "Existing user promoted to bootstrap admin");
        return Ok(BootstrapOutcome::Promoted);
    }

    let password_hash = hash_password(&config.bootstrap_password)?;
    let created = users
        .create(NewUser {
            email: &email,
            password_hash: &password_hash,
            display_name: &config.bootstrap_display_name,
            role: UserRole::Admin.as_str(),
            is_active: true,
        })
        .await?;

    info!(user_id = %created.id, "Bootstrap admin created");
    warn!(
        "SECURITY: remove ASP__ADMIN__BOOTSTRAP_PASSWORD from the environment and change the \
         admin password after first login"
    );
    Ok(BootstrapOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap()
    }

    #[tokio::test]
    async fn test_not_configured_skips_database() {
        let outcome = bootstrap_admin(&lazy_pool(), &AdminBootstrapConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome, BootstrapOutcome::NotConfigured);
    }

    #[tokio::test]
    async fn test_weak_password_is_rejected_before_database() {
        let config = AdminBootstrapConfig {
            bootstrap_email: "admin@example.com".to_string(),
            bootstrap_password: "short".to_string(),
            bootstrap_display_name: "Admin".to_string(),
        };
        let err = bootstrap_admin(&lazy_pool(), &config).await.unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }
}
