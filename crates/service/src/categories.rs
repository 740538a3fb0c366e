//! Read side of the category taxonomy.
//!
//! Handlers pass raw query-string values in; everything is normalized here
//! so the HTTP layer stays thin. Rows are projected into stable DTOs and
//! never returned as raw entities.

use common::pagination::{PageMeta, Pagination};
use models::{category, service};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use tracing::error;

use crate::errors::ServiceError;

/// Stable wire shape for a category, decoupled from the table layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub service_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub items: Vec<CategoryDto>,
    pub pagination: PageMeta,
}

/// Row shape produced by the aggregated listing query.
#[derive(Debug, FromQueryResult)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    service_count: i64,
}

impl From<CategoryRow> for CategoryDto {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            service_count: row.service_count,
        }
    }
}

/// Category columns plus the derived service count.
///
/// Counting `service.id` over a LEFT JOIN yields 0 for categories without
/// services; grouping by the primary key is enough for Postgres to accept
/// the remaining selected columns.
fn select_with_service_count() -> Select<category::Entity> {
    category::Entity::find()
        .select_only()
        .columns([
            category::Column::Id,
            category::Column::Name,
            category::Column::Slug,
            category::Column::Description,
        ])
        .column_as(service::Column::Id.count(), "service_count")
        .join(JoinType::LeftJoin, category::Relation::Service.def())
        .group_by(category::Column::Id)
}

/// Case-insensitive substring match against name OR description.
fn search_filter(search: Option<&str>) -> Option<Condition> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let pattern = format!("%{term}%");
    Some(
        Condition::any()
            .add(Expr::col((category::Entity, category::Column::Name)).ilike(pattern.as_str()))
            .add(
                Expr::col((category::Entity, category::Column::Description))
                    .ilike(pattern.as_str()),
            ),
    )
}

/// List categories with pagination and optional search, ordered by name.
///
/// The row fetch and the matching total count run as two independent
/// queries over the same filter; both must complete before a page is
/// produced, and either failure fails the pair.
pub async fn list_categories(
    db: &DatabaseConnection,
    pagination: Pagination,
    search: Option<&str>,
) -> Result<CategoryPage, ServiceError> {
    let filter = search_filter(search);
    let (offset, limit) = pagination.normalize();

    let mut rows_query = select_with_service_count()
        .order_by_asc(category::Column::Name)
        .offset(offset)
        .limit(limit);
    let mut count_query = category::Entity::find();
    if let Some(cond) = filter {
        rows_query = rows_query.filter(cond.clone());
        count_query = count_query.filter(cond);
    }

    let (rows, total) = tokio::try_join!(
        rows_query.into_model::<CategoryRow>().all(db),
        count_query.count(db),
    )
    .map_err(|e| {
        error!(error = %e, "category listing query failed");
        ServiceError::Db("Failed to fetch categories".into())
    })?;

    Ok(CategoryPage {
        items: rows.into_iter().map(CategoryDto::from).collect(),
        pagination: PageMeta::new(pagination, total),
    })
}

/// Parse a raw path segment into a category id. Anything that is not a
/// positive integer is rejected before storage is touched.
pub fn parse_category_id(raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServiceError::Validation("Invalid category id".into()))
}

/// Fetch a single category by primary key, including the derived service
/// count. Classified 400/404 errors pass through unchanged; anything else
/// from storage is logged and wrapped.
pub async fn get_category_by_id(
    db: &DatabaseConnection,
    raw_id: &str,
) -> Result<CategoryDto, ServiceError> {
    let id = parse_category_id(raw_id)?;

    let row = select_with_service_count()
        .filter(category::Column::Id.eq(id))
        .into_model::<CategoryRow>()
        .one(db)
        .await
        .map_err(|e| {
            error!(category_id = id, error = %e, "category lookup query failed");
            ServiceError::Db("Failed to fetch category".into())
        })?;

    row.map(CategoryDto::from)
        .ok_or_else(|| ServiceError::not_found("Category"))
}
