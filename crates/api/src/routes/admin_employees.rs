//! Admin CRUD for company employees.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::employee::{
    CreateEmployeeRequest, EmployeeView, ListEmployeesQuery, UpdateEmployeeRequest,
};
use domain::models::common::normalize_search;
use domain::models::{Employee, ToggleStatusResponse};
use persistence::repositories::{
    CompanyRepository, EmployeeChanges, EmployeeFilter, EmployeeRepository, NewEmployee,
};
use shared::pagination::Paginated;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
        .route("/:id/toggle-status", post(toggle_status))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Employee not found".to_string())
}

fn duplicate_code(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => {
            ApiError::field("employee_code", "Employee code already exists for this company")
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

/// GET /api/v1/admin/employees
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<ApiResponse<Paginated<EmployeeView>>, ApiError> {
    let repo = EmployeeRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = normalize_search(query.search.as_deref());
    let filter = EmployeeFilter {
        search: search.as_deref(),
        is_active: query.is_active,
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

/// GET /api/v1/admin/employees/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<EmployeeView>, ApiError> {
    let employee = EmployeeRepository::new(state.pool.clone())
        .find_view_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(employee.into()))
}

/// POST /api/v1/admin/employees
async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateEmployeeRequest>,
) -> Result<ApiResponse<Employee>, ApiError> {
    ensure_company(&state, request.company_id).await?;

    let employee = EmployeeRepository::new(state.pool.clone())
        .create(NewEmployee {
            company_id: request.company_id,
            employee_code: request.employee_code.trim(),
            full_name: request.full_name.trim(),
            designation: request.designation.as_deref().map(str::trim),
            card_no: request.card_no.as_deref().map(str::trim),
            is_active: request.is_active,
        })
        .await
        .map_err(duplicate_code)?;

    tracing::info!(employee_id = %employee.id, company_id = %employee.company_id, "Employee created");
    Ok(ApiResponse::created(employee.into(), "Employee created"))
}

/// PUT /api/v1/admin/employees/:id
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateEmployeeRequest>,
) -> Result<ApiResponse<Employee>, ApiError> {
    if let Some(company_id) = request.company_id {
        ensure_company(&state, company_id).await?;
    }

    let employee = EmployeeRepository::new(state.pool.clone())
        .update(
            id,
            EmployeeChanges {
                company_id: request.company_id,
                employee_code: request.employee_code.as_deref().map(str::trim),
                full_name: request.full_name.as_deref().map(str::trim),
                designation: request.designation.as_deref().map(str::trim),
                card_no: request.card_no.as_deref().map(str::trim),
                is_active: request.is_active,
            },
        )
        .await
        .map_err(duplicate_code)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(employee.into()).message("Employee updated"))
}

/// DELETE /api/v1/admin/employees/:id
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !EmployeeRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    Ok(ApiResponse::done("Employee deleted"))
}

/// POST /api/v1/admin/employees/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = EmployeeRepository::new(state.pool.clone())
        .toggle_status(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}
