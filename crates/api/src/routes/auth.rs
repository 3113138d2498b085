//! Registration, login, logout and password changes.

use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use domain::models::user::{
    normalize_email, ChangePasswordRequest, LoginRequest, RegisterRequest,
};
use domain::models::User;
use shared::crypto::sha256_hex;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ClientInfo, CurrentUser, ValidatedJson};
use crate::middleware::metrics::record_login;
use crate::response::ApiResponse;
use crate::services::auth::AuthError;

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    if !state.config.auth.allow_registration {
        return Err(AuthError::RegistrationDisabled.into());
    }
    let user = state.auth_service().register(&request).await?;
    Ok(ApiResponse::created(user, "Registration successful"))
}

/// POST /api/v1/auth/login
///
/// Returns the token in the body and, when enabled, as an HttpOnly cookie.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.auth_service().login(&request, &client).await {
        Ok(login) => {
            record_login("success");
            let mut headers = HeaderMap::new();
            state.cookies.add_session_cookie(&mut headers, &login.token);
            Ok((headers, ApiResponse::ok(login).message("Login successful")))
        }
        Err(err) => {
            let outcome = match &err {
                AuthError::InvalidCredentials => "invalid_credentials",
                AuthError::UserDisabled => "disabled",
                _ => "error",
            };
            record_login(outcome);
            tracing::warn!(
                email_sha256 = %sha256_hex(&normalize_email(&request.email)),
                client_ip = %client.ip,
                outcome,
                "Login failed"
            );
            Err(err.into())
        }
    }
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service().logout(&user.jti).await?;
    tracing::info!(user_id = %user.id, "User logged out");

    let mut headers = HeaderMap::new();
    state.cookies.add_clear_cookie(&mut headers);
    Ok((headers, ApiResponse::done("Logged out")))
}

/// GET /api/v1/auth/me
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> Result<ApiResponse<User>, ApiError> {
    let entity = persistence::repositories::UserRepository::new(state.pool.clone())
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::ok(entity.into()))
}

/// POST /api/v1/auth/change-password
///
/// Other sessions of the user are revoked; the current one stays valid.
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state.auth_service().change_password(&user, &request).await?;
    Ok(ApiResponse::done("Password changed"))
}
