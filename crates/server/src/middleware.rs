//! Request/response logging and error funneling for the HTTP pipeline.
//!
//! Both middlewares wrap the handler future via `axum::middleware::from_fn`;
//! neither touches the response object beyond reading it.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::{Body, HttpBody};
use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderName, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use crate::errors::{ApiError, ErrorDetails};

/// Request body cap shared with the JSON/form extractors.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_str(req: &Request, name: HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Log inbound request metadata and outbound status/timing/size.
///
/// Bodies are captured for non-GET requests only, buffered up to the body
/// cap and replayed downstream unchanged. Timing covers arrival until the
/// response is handed back to the transport stack.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();
    let ip = client_ip(&req);
    let user_agent = header_str(&req, header::USER_AGENT);

    let req = if method == Method::GET {
        info!(%method, path, %ip, user_agent, query, "incoming request");
        req
    } else {
        let (parts, body) = req.into_parts();
        match axum::body::to_bytes(body, BODY_LIMIT).await {
            Ok(bytes) => {
                info!(
                    %method,
                    path,
                    %ip,
                    user_agent,
                    query,
                    body = %String::from_utf8_lossy(&bytes),
                    "incoming request"
                );
                Request::from_parts(parts, Body::from(bytes))
            }
            Err(err) => {
                warn!(%method, path, %ip, error = %err, "failed to read request body");
                return ApiError::Validation("Invalid input data.".into()).into_response();
            }
        }
    };

    let response = next.run(req).await;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let response_bytes = response.body().size_hint().exact().unwrap_or(0);
    info!(
        %method,
        path,
        status = response.status().as_u16(),
        elapsed_ms,
        response_bytes,
        "outgoing response"
    );
    response
}

/// Log every rendered error exactly once, with request context attached.
///
/// `ApiError::into_response` records an [`ErrorDetails`] extension; no
/// other layer writes error log entries for the same failure.
pub async fn log_errors(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let url = req.uri().to_string();
    let ip = client_ip(&req);
    let user_agent = header_str(&req, header::USER_AGENT);

    let response = next.run(req).await;

    if let Some(err) = response.extensions().get::<ErrorDetails>() {
        error!(
            message = %err.message,
            detail = err.detail.as_deref(),
            status = err.status.as_u16(),
            %method,
            url,
            %ip,
            user_agent,
            "request failed"
        );
    }
    response
}

/// Convert handler panics into the standard error envelope so unexpected
/// failures follow the same path as returned errors.
pub fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Unexpected(detail).into_response()
}
