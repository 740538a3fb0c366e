use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use common::pagination::Pagination;
use service::categories::{self, CategoryDto, CategoryPage};

use crate::errors::ApiError;
use crate::state::AppState;

/// Query parameters accepted by the listing endpoint. Values arrive as raw
/// strings so out-of-range input can be coerced instead of rejected.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

#[utoipa::path(
    get, path = "/api/categories", tag = "categories",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated category listing"),
        (status = 500, description = "Fetch failed")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CategoryPage>, ApiError> {
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());
    let page = categories::list_categories(&state.db, pagination, query.search.as_deref()).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get, path = "/api/categories/{id}", tag = "categories",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category detail"),
        (status = 400, description = "Invalid category id"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryDto>, ApiError> {
    let dto = categories::get_category_by_id(&state.db, &id).await?;
    Ok(Json(dto))
}
