//! Admin CRUD for SQL Server endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::server_ip::{CreateServerIpRequest, UpdateServerIpRequest};
use domain::models::{ListQuery, ServerIp, ToggleStatusResponse};
use persistence::repositories::{ServerIpChanges, ServerIpRepository};
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
    ApiError::NotFound("Server IP not found".to_string())
}

fn duplicate_endpoint(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => {
            ApiError::field("ip_address", "This server address is already registered")
        }
        other => other,
    }
}

/// GET /api/v1/admin/server-ips
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Paginated<ServerIp>>, ApiError> {
    let repo = ServerIpRepository::new(state.pool.clone());
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

/// GET /api/v1/admin/server-ips/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ServerIp>, ApiError> {
    let server = ServerIpRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(server.into()))
}

/// POST /api/v1/admin/server-ips
async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateServerIpRequest>,
) -> Result<ApiResponse<ServerIp>, ApiError> {
    let server = ServerIpRepository::new(state.pool.clone())
        .create(
            request.ip_address.trim(),
            request.port,
            request.description.as_deref().map(str::trim),
            request.is_active,
        )
        .await
        .map_err(duplicate_endpoint)?;

    tracing::info!(server_ip_id = %server.id, address = %server.ip_address, port = server.port, "Server IP created");
    Ok(ApiResponse::created(server.into(), "Server IP created"))
}

/// PUT /api/v1/admin/server-ips/:id
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateServerIpRequest>,
) -> Result<ApiResponse<ServerIp>, ApiError> {
    let server = ServerIpRepository::new(state.pool.clone())
        .update(
            id,
            ServerIpChanges {
                ip_address: request.ip_address.as_deref().map(str::trim),
                port: request.port,
                description: request.description.as_deref().map(str::trim),
                is_active: request.is_active,
            },
        )
        .await
        .map_err(duplicate_endpoint)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(server.into()).message("Server IP updated"))
}

/// DELETE /api/v1/admin/server-ips/:id
///
/// Fails with a conflict while an assignment still points at the server.
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !ServerIpRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(server_ip_id = %id, "Server IP deleted");
    Ok(ApiResponse::done("Server IP deleted"))
}

/// POST /api/v1/admin/server-ips/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = ServerIpRepository::new(state.pool.clone())
        .toggle_status(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}
