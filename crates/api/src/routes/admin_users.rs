//! Admin user management.
//!
//! Deactivating or deleting a user ends their sessions. The last active admin
//! can be neither demoted, deactivated nor deleted.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::common::normalize_search;
use domain::models::user::{
    normalize_email, CreateUserRequest, ListUsersQuery, ResetPasswordRequest, UpdateUserRequest,
};
use domain::models::{ToggleStatusResponse, User};
use persistence::entities::UserEntity;
use persistence::repositories::{AdminGuarded, NewUser, UserChanges, UserFilter, UserRepository};
use shared::pagination::Paginated;
use shared::password::hash_password;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route("/:id/toggle-status", post(toggle_status))
        .route("/:id/reset-password", post(reset_password))
}

fn not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

fn duplicate_email(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::field("email", "Email already registered"),
        other => other,
    }
}

async fn load(repo: &UserRepository, id: Uuid) -> Result<UserEntity, ApiError> {
    repo.find_by_id(id).await?.ok_or_else(not_found)
}

fn guarded<T>(outcome: AdminGuarded<T>) -> Result<T, ApiError> {
    match outcome {
        AdminGuarded::Applied(value) => Ok(value),
        AdminGuarded::NotFound => Err(not_found()),
        AdminGuarded::LastAdmin => Err(ApiError::Conflict(
            "At least one active admin account must remain".to_string(),
        )),
    }
}

/// GET /api/v1/admin/users
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiResponse<Paginated<User>>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = normalize_search(query.search.as_deref());
    let filter = UserFilter {
        search: search.as_deref(),
        is_active: query.is_active,
        role: query.role.map(|r| r.as_str()),
    };

    let items = repo
        .list(&filter, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = repo.count(&filter).await?;
    Ok(ApiResponse::ok(Paginated::new(items, page, total)))
}

/// GET /api/v1/admin/users/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = load(&UserRepository::new(state.pool.clone()), id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// POST /api/v1/admin/users
async fn create(
    State(state): State<AppState>,
    admin: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let email = normalize_email(&request.email);
    let password_hash = hash_password(&request.password)?;

    let user = UserRepository::new(state.pool.clone())
        .create(NewUser {
            email: &email,
            password_hash: &password_hash,
            display_name: request.display_name.trim(),
            role: request.role.as_str(),
            is_active: request.is_active,
        })
        .await
        .map_err(duplicate_email)?;

    tracing::info!(user_id = %user.id, role = %user.role, admin_id = %admin.id, "User created by admin");
    Ok(ApiResponse::created(user.into(), "User created"))
}

/// PUT /api/v1/admin/users/:id
async fn update(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let email = request.email.as_deref().map(normalize_email);
    let outcome = UserRepository::new(state.pool.clone())
        .update_guarded(
            id,
            UserChanges {
                email: email.as_deref(),
                display_name: request.display_name.as_deref().map(str::trim),
                role: request.role.map(|r| r.as_str()),
                is_active: request.is_active,
            },
        )
        .await
        .map_err(duplicate_email)?;
    let (current, updated) = guarded(outcome)?;

    if current.is_active && !updated.is_active {
        let revoked = state.auth_service().revoke_all_sessions(id).await?;
        tracing::info!(user_id = %id, admin_id = %admin.id, revoked_sessions = revoked, "User deactivated");
    }
    Ok(ApiResponse::ok(updated.into()).message("User updated"))
}

/// DELETE /api/v1/admin/users/:id
async fn remove(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if id == admin.id {
        return Err(ApiError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }
    // Sessions are removed with the row.
    guarded(UserRepository::new(state.pool.clone()).delete_guarded(id).await?)?;
    tracing::info!(user_id = %id, admin_id = %admin.id, "User deleted");
    Ok(ApiResponse::done("User deleted"))
}

/// POST /api/v1/admin/users/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active =
        guarded(UserRepository::new(state.pool.clone()).toggle_status_guarded(id).await?)?;
    if !is_active {
        state.auth_service().revoke_all_sessions(id).await?;
    }
    tracing::info!(user_id = %id, admin_id = %admin.id, is_active, "User status toggled");
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}

/// POST /api/v1/admin/users/:id/reset-password
async fn reset_password(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .auth_service()
        .reset_password(id, &request.new_password)
        .await?;
    tracing::info!(user_id = %id, admin_id = %admin.id, "Password reset by admin");
    Ok(ApiResponse::done("Password reset; the user must log in again"))
}
