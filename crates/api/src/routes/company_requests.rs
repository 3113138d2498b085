//! Access requests, user side: ask for access to a company's database.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Router,
};
use domain::models::company_request::{
    CompanyRequestView, CreateCompanyRequestRequest, ListRequestsQuery,
};
use domain::models::CompanyRequest;
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
        .route("/:id/cancel", post(cancel))
}

/// GET /api/v1/company-requests
async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<ApiResponse<Paginated<CompanyRequestView>>, ApiError> {
    let filter = RequestFilter {
        status: query.status,
        company_id: query.company_id,
        user_id: Some(user.id),
    };
    let page = state
        .access_requests()
        .list(filter, query.page_request())
        .await?;
    Ok(ApiResponse::ok(page))
}

/// POST /api/v1/company-requests
async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateCompanyRequestRequest>,
) -> Result<ApiResponse<CompanyRequestView>, ApiError> {
    let created = state.access_requests().create(&user, &request).await?;
    Ok(ApiResponse::created(created, "Access request submitted"))
}

/// GET /api/v1/company-requests/:id
async fn get_one(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CompanyRequestView>, ApiError> {
    Ok(ApiResponse::ok(
        state.access_requests().get_owned(&user, id).await?,
    ))
}

/// POST /api/v1/company-requests/:id/cancel
async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CompanyRequest>, ApiError> {
    let cancelled = state.access_requests().cancel(&user, id).await?;
    Ok(ApiResponse::ok(cancelled).message("Request cancelled"))
}
