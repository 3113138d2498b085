//! Admin grants of company sync access to users.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::common::normalize_search;
use domain::models::database_access::{
    CreateDatabaseAccessRequest, DatabaseAccessView, ListDatabaseAccessQuery,
    UpdateDatabaseAccessRequest,
};
use domain::models::ToggleStatusResponse;
use persistence::repositories::{
    AccessFilter, CompanyRepository, DatabaseAccessRepository, UserRepository,
};
use shared::pagination::Paginated;
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
}

fn not_found() -> ApiError {
    ApiError::NotFound("Database access grant not found".to_string())
}

fn duplicate_grant(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => {
            ApiError::field("company_id", "User already has access to this company")
        }
        other => other,
    }
}

async fn ensure_company(state: &AppState, company_id: Uuid) -> Result<(), ApiError> {
    CompanyRepository::new(state.pool.clone())
        .find_by_id(company_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::field("company_id", "Company does not exist"))
}

async fn view(state: &AppState, id: Uuid) -> Result<DatabaseAccessView, ApiError> {
    Ok(DatabaseAccessRepository::new(state.pool.clone())
        .find_view_by_id(id)
        .await?
        .ok_or_else(not_found)?
        .into())
}

/// GET /api/v1/admin/database-access
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListDatabaseAccessQuery>,
) -> Result<ApiResponse<Paginated<DatabaseAccessView>>, ApiError> {
    let repo = DatabaseAccessRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = normalize_search(query.search.as_deref());
    let filter = AccessFilter {
        search: search.as_deref(),
        is_active: query.is_active,
        user_id: query.user_id,
        company_id: query.company_id,
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

/// GET /api/v1/admin/database-access/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<DatabaseAccessView>, ApiError> {
    Ok(ApiResponse::ok(view(&state, id).await?))
}

/// POST /api/v1/admin/database-access
async fn create(
    State(state): State<AppState>,
    admin: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateDatabaseAccessRequest>,
) -> Result<ApiResponse<DatabaseAccessView>, ApiError> {
    UserRepository::new(state.pool.clone())
        .find_by_id(request.user_id)
        .await?
        .ok_or_else(|| ApiError::field("user_id", "User does not exist"))?;
    ensure_company(&state, request.company_id).await?;

    let grant = DatabaseAccessRepository::new(state.pool.clone())
        .create(
            request.user_id,
            request.company_id,
            Some(admin.id),
            request.is_active,
        )
        .await
        .map_err(duplicate_grant)?;

    tracing::info!(
        access_id = %grant.id,
        user_id = %grant.user_id,
        company_id = %grant.company_id,
        admin_id = %admin.id,
        "Database access granted"
    );
    Ok(ApiResponse::created(
        view(&state, grant.id).await?,
        "Access granted",
    ))
}

/// PUT /api/v1/admin/database-access/:id
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDatabaseAccessRequest>,
) -> Result<ApiResponse<DatabaseAccessView>, ApiError> {
    if let Some(company_id) = request.company_id {
        ensure_company(&state, company_id).await?;
    }
    DatabaseAccessRepository::new(state.pool.clone())
        .update(id, request.company_id, request.is_active)
        .await
        .map_err(duplicate_grant)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(view(&state, id).await?).message("Access updated"))
}

/// DELETE /api/v1/admin/database-access/:id
///
/// Revokes the grant. Existing sync requests of the user stay as they are.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !DatabaseAccessRepository::new(state.pool.clone())
        .delete(id)
        .await?
    {
        return Err(not_found());
    }
    tracing::info!(access_id = %id, "Database access revoked");
    Ok(ApiResponse::done("Access revoked"))
}

/// POST /api/v1/admin/database-access/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = DatabaseAccessRepository::new(state.pool.clone())
        .toggle_status(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}
