//! Selection lists for authenticated users: active companies and tools, and
//! the companies the caller may sync.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use domain::models::database_access::MyAccessItem;
use domain::models::{ListQuery, LookupItem};
use persistence::repositories::{CompanyRepository, DatabaseAccessRepository, ToolRepository};
use shared::pagination::Paginated;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::response::ApiResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies))
        .route("/tools", get(list_tools))
        .route("/my-access", get(my_access))
}

/// GET /api/v1/companies
async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Paginated<LookupItem>>, ApiError> {
    let repo = CompanyRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = query.search_term();

    let items = repo
        .list(search.as_deref(), Some(true), page.limit(), page.offset())
        .await?
        .into_iter()
        .map(|c| LookupItem {
            id: c.id,
            code: c.code,
            name: c.name,
        })
        .collect();
    let total = repo.count(search.as_deref(), Some(true)).await?;
    Ok(ApiResponse::ok(Paginated::new(items, page, total)))
}

/// GET /api/v1/tools
async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Paginated<LookupItem>>, ApiError> {
    let repo = ToolRepository::new(state.pool.clone());
    let page = query.page_request();
    let search = query.search_term();

    let items = repo
        .list(search.as_deref(), Some(true), page.limit(), page.offset())
        .await?
        .into_iter()
        .map(|t| LookupItem {
            id: t.id,
            code: t.code,
            name: t.name,
        })
        .collect();
    let total = repo.count(search.as_deref(), Some(true)).await?;
    Ok(ApiResponse::ok(Paginated::new(items, page, total)))
}

/// GET /api/v1/my-access
async fn my_access(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<ApiResponse<Vec<MyAccessItem>>, ApiError> {
    let items = DatabaseAccessRepository::new(state.pool.clone())
        .list_for_user(user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(ApiResponse::ok(items))
}
