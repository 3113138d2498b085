//! Registration, login, session validation and password changes.

use chrono::Utc;
use domain::models::user::{
    normalize_email, ChangePasswordRequest, LoginRequest, LoginResponse, LoginSession,
    RegisterRequest,
};
use domain::models::{User, UserRole};
use persistence::repositories::{NewUser, SessionRepository, UserRepository};
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::{ClientInfo, CurrentUser};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Self-service registration is disabled")]
    RegistrationDisabled,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User account is disabled")]
    UserDisabled,

    #[error("Session is no longer valid")]
    SessionInvalid,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::RegistrationDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidCredentials | AuthError::SessionInvalid => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::UserDisabled => ApiError::Forbidden(err.to_string()),
            AuthError::WrongCurrentPassword => ApiError::field("current_password", err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::Token(e) => e.into(),
            AuthError::Password(e) => e.into(),
            AuthError::Database(e) => e.into(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionRepository,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            jwt,
        }
    }

    /// Creates an active `user` account. The caller validates the request.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AuthError> {
        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;
        let created = self
            .users
            .create(NewUser {
                email: &email,
                password_hash: &password_hash,
                display_name: request.display_name.trim(),
                role: UserRole::User.as_str(),
                is_active: true,
            })
            .await;

        match created {
            Ok(entity) => {
                tracing::info!(user_id = %entity.id, "User registered");
                Ok(entity.into())
            }
            Err(e) if persistence::db::is_unique_violation(&e) => {
                Err(AuthError::EmailAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verifies the password, issues a token and records its session.
    pub async fn login(
        &self,
        request: &LoginRequest,
        client: &ClientInfo,
    ) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&request.email);
        let user: User = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let issued = self.jwt.issue(user.id)?;
        self.sessions
            .create(
                user.id,
                &issued.jti,
                client.user_agent.as_deref(),
                Some(&client.ip_string()),
                issued.expires_at,
            )
            .await?;
        self.users.update_last_login(user.id).await?;

        tracing::info!(user_id = %user.id, client_ip = %client.ip, "User logged in");

        Ok(LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user,
        })
    }

    /// Resolves a token to the caller: signature and expiry, then an open
    /// session row, then an active user. The role comes from the user row.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.jwt.validate(token)?;
        let user_id = claims.user_id()?;

        let session: LoginSession = self
            .sessions
            .find_by_jti(&claims.jti)
            .await?
            .ok_or(AuthError::SessionInvalid)?
            .into();
        if session.user_id != user_id || !session.is_valid_at(Utc::now()) {
            return Err(AuthError::SessionInvalid);
        }

        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::SessionInvalid)?
            .into();
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        Ok(CurrentUser::from_user(&user, claims.jti))
    }

    pub async fn logout(&self, jti: &str) -> Result<(), AuthError> {
        if !self.sessions.revoke(jti).await? {
            tracing::debug!("Logout for an already revoked session");
        }
        Ok(())
    }

    /// Changes the caller's password and ends their other sessions.
    pub async fn change_password(
        &self,
        current: &CurrentUser,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        let user: User = self
            .users
            .find_by_id(current.id)
            .await?
            .ok_or(AuthError::UserNotFound)?
            .into();
        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AuthError::WrongCurrentPassword);
        }

        let hash = hash_password(&request.new_password)?;
        self.users.set_password_hash(user.id, &hash).await?;
        let revoked = self
            .sessions
            .revoke_all_for_user(user.id, Some(&current.jti))
            .await?;

        tracing::info!(user_id = %user.id, revoked_sessions = revoked, "Password changed");
        Ok(())
    }

    /// Admin reset: sets a new password and ends every session of the user.
    pub async fn reset_password(&self, user_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        let hash = hash_password(new_password)?;
        if !self.users.set_password_hash(user_id, &hash).await? {
            return Err(AuthError::UserNotFound);
        }
        self.sessions.revoke_all_for_user(user_id, None).await?;
        Ok(())
    }

    /// Ends every session of a user, e.g. after deactivation.
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.sessions.revoke_all_for_user(user_id, None).await?)
    }
}
