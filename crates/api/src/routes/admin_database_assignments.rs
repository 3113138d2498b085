//! Admin management of company database credentials.
//!
//! Passwords are sealed before they reach the repository and never leave the
//! server; responses only report whether one is stored.

use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::common::normalize_search;
use domain::models::database_assignment::{
    ConnectionTestResponse, CreateDatabaseAssignmentRequest, DatabaseAssignmentView,
    ListDatabaseAssignmentsQuery, UpdateDatabaseAssignmentRequest,
};
use domain::models::ToggleStatusResponse;
use persistence::repositories::{
    AssignmentChanges, AssignmentFilter, CompanyRepository, DatabaseAssignmentRepository,
    NewAssignment, ServerIpRepository,
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
        .route("/:id/test", post(test_connection))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Database assignment not found".to_string())
}

fn active_conflict(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::field(
            "company_id",
            "Company already has an active database assignment",
        ),
        other => other,
    }
}

async fn ensure_server_ip(state: &AppState, server_ip_id: Uuid) -> Result<(), ApiError> {
    ServerIpRepository::new(state.pool.clone())
        .find_by_id(server_ip_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::field("server_ip_id", "Server IP does not exist"))
}

async fn view(state: &AppState, id: Uuid) -> Result<DatabaseAssignmentView, ApiError> {
    Ok(DatabaseAssignmentRepository::new(state.pool.clone())
        .find_view_by_id(id)
        .await?
        .ok_or_else(not_found)?
        .into())
}

/// GET /api/v1/admin/database-assignments
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListDatabaseAssignmentsQuery>,
) -> Result<ApiResponse<Paginated<DatabaseAssignmentView>>, ApiError> {
    let repo = DatabaseAssignmentRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = normalize_search(query.search.as_deref());
    let filter = AssignmentFilter {
        search: search.as_deref(),
        is_active: query.is_active,
        company_id: query.company_id,
        server_ip_id: query.server_ip_id,
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

/// GET /api/v1/admin/database-assignments/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<DatabaseAssignmentView>, ApiError> {
    Ok(ApiResponse::ok(view(&state, id).await?))
}

/// POST /api/v1/admin/database-assignments
async fn create(
    State(state): State<AppState>,
    admin: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateDatabaseAssignmentRequest>,
) -> Result<ApiResponse<DatabaseAssignmentView>, ApiError> {
    CompanyRepository::new(state.pool.clone())
        .find_by_id(request.company_id)
        .await?
        .ok_or_else(|| ApiError::field("company_id", "Company does not exist"))?;
    ensure_server_ip(&state, request.server_ip_id).await?;

    let sealed = state.cipher.encrypt(&request.password)?;
    let assignment = DatabaseAssignmentRepository::new(state.pool.clone())
        .create(NewAssignment {
            company_id: request.company_id,
            server_ip_id: request.server_ip_id,
            database_name: request.database_name.trim(),
            db_username: request.db_username.trim(),
            encrypted_password: &sealed,
            is_active: request.is_active,
            assigned_by: Some(admin.id),
        })
        .await
        .map_err(active_conflict)?;

    tracing::info!(
        assignment_id = %assignment.id,
        company_id = %assignment.company_id,
        server_ip_id = %assignment.server_ip_id,
        admin_id = %admin.id,
        "Database assignment created"
    );
    Ok(ApiResponse::created(
        view(&state, assignment.id).await?,
        "Database assignment created",
    ))
}

/// PUT /api/v1/admin/database-assignments/:id
///
/// An omitted or empty password keeps the stored one.
async fn update(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDatabaseAssignmentRequest>,
) -> Result<ApiResponse<DatabaseAssignmentView>, ApiError> {
    if let Some(server_ip_id) = request.server_ip_id {
        ensure_server_ip(&state, server_ip_id).await?;
    }
    let sealed = match request.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(state.cipher.encrypt(password)?),
        None => None,
    };

    DatabaseAssignmentRepository::new(state.pool.clone())
        .update(
            id,
            AssignmentChanges {
                server_ip_id: request.server_ip_id,
                database_name: request.database_name.as_deref().map(str::trim),
                db_username: request.db_username.as_deref().map(str::trim),
                encrypted_password: sealed.as_deref(),
                is_active: request.is_active,
                assigned_by: Some(admin.id),
            },
        )
        .await
        .map_err(active_conflict)?
        .ok_or_else(not_found)?;

    tracing::info!(assignment_id = %id, admin_id = %admin.id, password_changed = sealed.is_some(), "Database assignment updated");
    Ok(ApiResponse::ok(view(&state, id).await?).message("Database assignment updated"))
}

/// DELETE /api/v1/admin/database-assignments/:id
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !DatabaseAssignmentRepository::new(state.pool.clone())
        .delete(id)
        .await?
    {
        return Err(not_found());
    }
    tracing::info!(assignment_id = %id, "Database assignment deleted");
    Ok(ApiResponse::done("Database assignment deleted"))
}

/// POST /api/v1/admin/database-assignments/:id/toggle-status
///
/// Activating fails while another assignment of the company is active.
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = DatabaseAssignmentRepository::new(state.pool.clone())
        .toggle_status(id)
        .await
        .map_err(active_conflict)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}

/// POST /api/v1/admin/database-assignments/:id/test
///
/// Connects to the company database with the stored credentials. An
/// unreachable server is reported in the body, not as an HTTP error.
async fn test_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ConnectionTestResponse>, ApiError> {
    let assignment = DatabaseAssignmentRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    let spec = state.credentials().for_assignment(&assignment).await?;

    let started = Instant::now();
    let result = state.gateway.ping(&spec).await;
    let elapsed = started.elapsed();

    let response = match result {
        Ok(latency) => ConnectionTestResponse {
            assignment_id: id,
            reachable: true,
            latency_ms: latency.as_millis() as u64,
            error: None,
        },
        Err(err) => {
            tracing::warn!(assignment_id = %id, target = %spec.target(), error = %err, "Connection test failed");
            ConnectionTestResponse {
                assignment_id: id,
                reachable: false,
                latency_ms: elapsed.as_millis() as u64,
                error: Some(err.to_string()),
            }
        }
    };
    let message = if response.reachable {
        "Connection successful"
    } else {
        "Connection failed"
    };
    Ok(ApiResponse::ok(response).message(message))
}
