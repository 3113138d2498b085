//! Sync requests, user side.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::company_request::ListRequestsQuery;
use domain::models::sync_request::{
    CreateSyncRequestRequest, SyncRequestView, SyncStatusResponse,
};
use domain::models::SyncRequest;
use persistence::repositories::RequestFilter;
use shared::pagination::Paginated;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_mine).post(create))
        .route("/:id", get(get_one))
        .route("/:id/status", get(status))
        .route("/:id/cancel", post(cancel))
}

/// GET /api/v1/sync-requests
async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<ApiResponse<Paginated<SyncRequestView>>, ApiError> {
    let filter = RequestFilter {
        status: query.status,
        company_id: query.company_id,
        user_id: Some(user.id),
    };
    Ok(ApiResponse::ok(
        state.sync_requests().list(filter, query.page_request()).await?,
    ))
}

/// POST /api/v1/sync-requests
async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateSyncRequestRequest>,
) -> Result<ApiResponse<SyncRequestView>, ApiError> {
    let created = state.sync_requests().create(&user, &request).await?;
    Ok(ApiResponse::created(created, "Sync request submitted"))
}

/// GET /api/v1/sync-requests/:id
async fn get_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncRequestView>, ApiError> {
    Ok(ApiResponse::ok(state.sync_requests().get_owned(&user, id).await?))
}

/// GET /api/v1/sync-requests/:id/status
///
/// Polled by the UI while a sync is in progress.
async fn status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncStatusResponse>, ApiError> {
    let outcome = state.sync_requests().poll_status(id, Some(user.id)).await?;
    Ok(ApiResponse::ok(outcome.status).message(outcome.message))
}

/// POST /api/v1/sync-requests/:id/cancel
async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncRequest>, ApiError> {
    let cancelled = state.sync_requests().cancel(&user, id).await?;
    Ok(ApiResponse::ok(cancelled).message("Sync request cancelled"))
}
