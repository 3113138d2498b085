//! Sync requests, admin side: dispatch to the company database, complete,
//! reject and poll.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::company_request::{ListRequestsQuery, RejectRequest};
use domain::models::sync_request::{
    CompleteSyncRequestRequest, SyncRequestView, SyncStatusResponse,
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
        .route("/", get(list))
        .route("/:id", get(get_one))
        .route("/:id/status", get(status))
        .route("/:id/dispatch", post(dispatch))
        .route("/:id/complete", post(complete))
        .route("/:id/reject", post(reject))
}

/// GET /api/v1/admin/sync-requests
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<ApiResponse<Paginated<SyncRequestView>>, ApiError> {
    let filter = RequestFilter {
        status: query.status,
        company_id: query.company_id,
        user_id: query.user_id,
    };
    Ok(ApiResponse::ok(
        state.sync_requests().list(filter, query.page_request()).await?,
    ))
}

/// GET /api/v1/admin/sync-requests/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncRequestView>, ApiError> {
    Ok(ApiResponse::ok(state.sync_requests().get(id).await?))
}

/// GET /api/v1/admin/sync-requests/:id/status
async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncStatusResponse>, ApiError> {
    let outcome = state.sync_requests().poll_status(id, None).await?;
    Ok(ApiResponse::ok(outcome.status).message(outcome.message))
}

/// POST /api/v1/admin/sync-requests/:id/dispatch
async fn dispatch(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SyncRequest>, ApiError> {
    let dispatched = state.sync_requests().dispatch(&admin, id).await?;
    Ok(ApiResponse::ok(dispatched).message("Sync request dispatched"))
}

/// POST /api/v1/admin/sync-requests/:id/complete
async fn complete(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CompleteSyncRequestRequest>,
) -> Result<ApiResponse<SyncRequest>, ApiError> {
    let completed = state
        .sync_requests()
        .complete(&admin, id, request.admin_note.as_deref())
        .await?;
    let message = match completed.last_error {
        Some(_) => "Sync request completed; company database was not updated",
        None => "Sync request completed",
    };
    Ok(ApiResponse::ok(completed).message(message))
}

/// POST /api/v1/admin/sync-requests/:id/reject
async fn reject(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RejectRequest>,
) -> Result<ApiResponse<SyncRequest>, ApiError> {
    let rejected = state
        .sync_requests()
        .reject(&admin, id, request.admin_note.as_deref())
        .await?;
    Ok(ApiResponse::ok(rejected).message("Sync request rejected"))
}
