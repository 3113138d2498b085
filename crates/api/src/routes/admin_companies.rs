//! Admin CRUD for companies.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::company::{normalize_code, CreateCompanyRequest, UpdateCompanyRequest};
use domain::models::{Company, ListQuery, ToggleStatusResponse};
use persistence::repositories::{CompanyChanges, CompanyRepository};
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
    ApiError::NotFound("Company not found".to_string())
}

fn duplicate_code(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::field("code", "Company code already exists"),
        other => other,
    }
}

/// GET /api/v1/admin/companies
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Paginated<Company>>, ApiError> {
    let repo = CompanyRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = query.search_term();

    let items = repo
        .list(search.as_deref(), query.is_active, page.limit(), page.offset())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let total = repo.count(search.as_deref(), query.is_active).await?;
    Ok(ApiResponse::ok(Paginated::new(items, page, total)))
}

/// GET /api/v1/admin/companies/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Company>, ApiError> {
    let company = CompanyRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(company.into()))
}

/// POST /api/v1/admin/companies
async fn create(
    State(state): State<AppState>,
    admin: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequest>,
) -> Result<ApiResponse<Company>, ApiError> {
    let code = normalize_code(&request.code);
    let company = CompanyRepository::new(state.pool.clone())
        .create(
            &code,
            request.name.trim(),
            request.address.as_deref().map(str::trim),
            request.is_active,
        )
        .await
        .map_err(duplicate_code)?;

    tracing::info!(company_id = %company.id, code = %company.code, admin_id = %admin.id, "Company created");
    Ok(ApiResponse::created(company.into(), "Company created"))
}

/// PUT /api/v1/admin/companies/:id
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCompanyRequest>,
) -> Result<ApiResponse<Company>, ApiError> {
    let code = request.code.as_deref().map(normalize_code);
    let company = CompanyRepository::new(state.pool.clone())
        .update(
            id,
            CompanyChanges {
                code: code.as_deref(),
                name: request.name.as_deref().map(str::trim),
                address: request.address.as_deref().map(str::trim),
                is_active: request.is_active,
            },
        )
        .await
        .map_err(duplicate_code)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(company.into()).message("Company updated"))
}

/// DELETE /api/v1/admin/companies/:id
///
/// Companies with employees, credentials, grants or requests cannot be deleted.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !CompanyRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(company_id = %id, "Company deleted");
    Ok(ApiResponse::done("Company deleted"))
}

/// POST /api/v1/admin/companies/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = CompanyRepository::new(state.pool.clone())
        .toggle_status(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }).message(if is_active {
        "Company activated"
    } else {
        "Company deactivated"
    }))
}
