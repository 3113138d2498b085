//! User repository for database operations.

use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

use super::like_pattern;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, is_active, \
                            last_login_at, created_at, updated_at";

/// Fields of a user insert.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub is_active: bool,
}

/// Partial user update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub role: Option<&'a str>,
    pub is_active: Option<bool>,
}

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter<'a> {
    pub search: Option<&'a str>,
    pub is_active: Option<bool>,
    pub role: Option<&'a str>,
}

/// Result of a change that could remove an active admin.
#[derive(Debug)]
pub enum AdminGuarded<T> {
    Applied(T),
    NotFound,
    /// The change would leave no active admin; nothing was written.
    LastAdmin,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by (already normalized) email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, user: NewUser<'_>) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, password_hash, display_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.display_name)
        .bind(user.role)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges<'_>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        Self::apply_changes(&self.pool, id, &changes).await
    }

    async fn apply_changes<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        changes: &UserChanges<'_>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                display_name = COALESCE($3, display_name),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.display_name)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(executor)
        .await;
        timer.record();
        result
    }

    /// Replace the password hash. Returns false when the user does not exist.
    pub async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("set_user_password_hash");
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    pub async fn update_last_login(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_user_last_login");
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(())
    }

    /// Locks the active admins, in id order, then the target row.
    ///
    /// Concurrent guarded changes queue on the same locks, so each one sees
    /// the admin set the previous one left behind.
    async fn lock_for_admin_change(
        conn: &mut PgConnection,
        id: Uuid,
    ) -> Result<(Vec<Uuid>, Option<UserEntity>), sqlx::Error> {
        let admins = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE role = 'admin' AND is_active ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut *conn)
        .await?;
        let target = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok((admins, target))
    }

    /// Partial update that refuses to demote or deactivate the last active
    /// admin. Returns the row before and after the change.
    pub async fn update_guarded(
        &self,
        id: Uuid,
        changes: UserChanges<'_>,
    ) -> Result<AdminGuarded<(UserEntity, UserEntity)>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let (admins, target) = Self::lock_for_admin_change(&mut *tx, id).await?;
        let Some(before) = target else {
            return Ok(AdminGuarded::NotFound);
        };

        let role = changes.role.unwrap_or(before.role.as_str());
        let is_active = changes.is_active.unwrap_or(before.is_active);
        let stays_admin = role == "admin" && is_active;
        if admins.contains(&id) && !stays_admin && admins.len() <= 1 {
            return Ok(AdminGuarded::LastAdmin);
        }

        let Some(after) = Self::apply_changes(&mut *tx, id, &changes).await? else {
            return Ok(AdminGuarded::NotFound);
        };
        tx.commit().await?;
        Ok(AdminGuarded::Applied((before, after)))
    }

    /// Flip `is_active` unless that deactivates the last active admin.
    /// Returns the new value.
    pub async fn toggle_status_guarded(
        &self,
        id: Uuid,
    ) -> Result<AdminGuarded<bool>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let (admins, target) = Self::lock_for_admin_change(&mut *tx, id).await?;
        if target.is_none() {
            return Ok(AdminGuarded::NotFound);
        }
        if admins.contains(&id) && admins.len() <= 1 {
            return Ok(AdminGuarded::LastAdmin);
        }

        let Some(is_active) = super::toggle_active(&mut *tx, "users", id).await? else {
            return Ok(AdminGuarded::NotFound);
        };
        tx.commit().await?;
        Ok(AdminGuarded::Applied(is_active))
    }

    /// Delete unless the user is the last active admin. Sessions go with the
    /// row; a user still referenced by requests fails with a foreign key
    /// violation and nothing changes.
    pub async fn delete_guarded(&self, id: Uuid) -> Result<AdminGuarded<()>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let (admins, target) = Self::lock_for_admin_change(&mut *tx, id).await?;
        if target.is_none() {
            return Ok(AdminGuarded::NotFound);
        }
        if admins.contains(&id) && admins.len() <= 1 {
            return Ok(AdminGuarded::LastAdmin);
        }

        if !super::delete_by_id(&mut *tx, "users", id).await? {
            return Ok(AdminGuarded::NotFound);
        }
        tx.commit().await?;
        Ok(AdminGuarded::Applied(()))
    }

    pub async fn list(
        &self,
        filter: &UserFilter<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1 OR display_name ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::text IS NULL OR role = $3)
            ORDER BY created_at DESC, id
            LIMIT $4 OFFSET $5
            "#,
            USER_COLUMNS
        ))
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self, filter: &UserFilter<'_>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1 OR display_name ILIKE $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::text IS NULL OR role = $3)
            "#,
        )
        .bind(like_pattern(filter.search))
        .bind(filter.is_active)
        .bind(filter.role)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Number of active admin accounts.
    pub async fn count_active_admins(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_admins");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active",
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
