use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CategoryDoc {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub service_count: i64,
}

#[derive(ToSchema)]
pub struct PageMetaDoc {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::categories::list,
        crate::routes::categories::get_by_id,
    ),
    components(
        schemas(
            HealthResponse,
            CategoryDoc,
            PageMetaDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "categories")
    )
)]
pub struct ApiDoc;
