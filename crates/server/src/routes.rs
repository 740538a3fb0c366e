use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use chrono::Utc;
use configs::AppConfig;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

use common::types::Health;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{self, BODY_LIMIT};
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod categories;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Catch-all for unmatched routes; must never fire for registered `/api`
/// paths.
async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": format!("Route {} {} not found", method, uri.path()),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// CORS with credentials enabled. Production restricts origins to the
/// configured list; elsewhere the request origin is mirrored (the wildcard
/// origin is rejected by browsers when credentials are on).
pub fn build_cors(config: &AppConfig) -> CorsLayer {
    let allow_origin = if config.env.is_production() {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ])
}

/// Security headers on every response; CSP only in production.
fn with_security_headers(router: Router, production: bool) -> Router {
    let mut router = router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));
    if production {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ));
    }
    router
}

/// Build the full application router: health + docs, `/api` routes, the
/// 404 fallback, and the middleware stack in its fixed order.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let is_production = state.config.env.is_production();
    let is_test = state.config.env.is_test();

    let api = Router::new()
        .route("/categories", get(categories::list))
        .route("/categories/:id", get(categories::get_by_id));

    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(middleware::log_errors))
        .layer(axum_middleware::from_fn(middleware::log_requests));

    // Access log; tests keep their output clean
    if !is_test {
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );
    }

    let router = router
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors);
    let router = with_security_headers(router, is_production);
    router.layer(CatchPanicLayer::custom(middleware::panic_response))
}
