//! Admin CRUD for sync tools.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::tool::{CreateToolRequest, UpdateToolRequest};
use domain::models::{ListQuery, ToggleStatusResponse, Tool};
use persistence::repositories::{ToolChanges, ToolRepository};
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
    ApiError::NotFound("Tool not found".to_string())
}

fn duplicate_code(err: sqlx::Error) -> ApiError {
    match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::field("code", "Tool code already exists"),
        other => other,
    }
}

/// GET /api/v1/admin/tools
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Paginated<Tool>>, ApiError> {
    let repo = ToolRepository::new(state.pool.clone());
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

/// GET /api/v1/admin/tools/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Tool>, ApiError> {
    let tool = ToolRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(tool.into()))
}

/// POST /api/v1/admin/tools
async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateToolRequest>,
) -> Result<ApiResponse<Tool>, ApiError> {
    let tool = ToolRepository::new(state.pool.clone())
        .create(
            request.code.trim(),
            request.name.trim(),
            request.description.as_deref().map(str::trim),
            request.is_active,
        )
        .await
        .map_err(duplicate_code)?;

    tracing::info!(tool_id = %tool.id, code = %tool.code, "Tool created");
    Ok(ApiResponse::created(tool.into(), "Tool created"))
}

/// PUT /api/v1/admin/tools/:id
async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateToolRequest>,
) -> Result<ApiResponse<Tool>, ApiError> {
    let tool = ToolRepository::new(state.pool.clone())
        .update(
            id,
            ToolChanges {
                code: request.code.as_deref().map(str::trim),
                name: request.name.as_deref().map(str::trim),
                description: request.description.as_deref().map(str::trim),
                is_active: request.is_active,
            },
        )
        .await
        .map_err(duplicate_code)?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(tool.into()).message("Tool updated"))
}

/// DELETE /api/v1/admin/tools/:id
async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<()>, ApiError> {
    if !ToolRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(tool_id = %id, "Tool deleted");
    Ok(ApiResponse::done("Tool deleted"))
}

/// POST /api/v1/admin/tools/:id/toggle-status
async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ToggleStatusResponse>, ApiError> {
    let is_active = ToolRepository::new(state.pool.clone())
        .toggle_status(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok(ToggleStatusResponse { id, is_active }))
}
