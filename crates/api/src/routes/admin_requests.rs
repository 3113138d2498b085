//! Access requests, admin side: review, approve with credentials, reject.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::company_request::{
    ApproveCompanyRequestRequest, CompanyRequestView, ListRequestsQuery, RejectRequest,
};
use domain::models::CompanyRequest;
use persistence::repositories::RequestFilter;
use shared::pagination::Paginated;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::response::ApiResponse;
use crate::services::access_requests::ApprovedRequest;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/:id", get(get_one))
        .route("/:id/approve", post(approve))
        .route("/:id/reject", post(reject))
}

/// GET /api/v1/admin/company-requests
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<ApiResponse<Paginated<CompanyRequestView>>, ApiError> {
    let filter = RequestFilter {
        status: query.status,
        company_id: query.company_id,
        user_id: query.user_id,
    };
    Ok(ApiResponse::ok(
        state
            .access_requests()
            .list(filter, query.page_request())
            .await?,
    ))
}

/// GET /api/v1/admin/company-requests/:id
async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CompanyRequestView>, ApiError> {
    Ok(ApiResponse::ok(state.access_requests().get(id).await?))
}

/// POST /api/v1/admin/company-requests/:id/approve
///
/// `credentials` is required when the company has no active assignment and
/// replaces the active one otherwise.
async fn approve(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ApproveCompanyRequestRequest>,
) -> Result<ApiResponse<ApprovedRequest>, ApiError> {
    let approved = state.access_requests().approve(&admin, id, &request).await?;
    Ok(ApiResponse::ok(approved).message("Request approved"))
}

/// POST /api/v1/admin/company-requests/:id/reject
async fn reject(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RejectRequest>,
) -> Result<ApiResponse<CompanyRequest>, ApiError> {
    let rejected = state
        .access_requests()
        .reject(&admin, id, request.admin_note.as_deref())
        .await?;
    Ok(ApiResponse::ok(rejected).message("Request rejected"))
}
