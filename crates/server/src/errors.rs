use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

use models::errors::ModelError;
use service::errors::ServiceError;

/// Application error taxonomy. Each variant knows its HTTP status and
/// whether its message is safe to show to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Reference(String),
    #[error("Invalid token.")]
    InvalidToken,
    #[error("Token expired.")]
    TokenExpired,
    /// Expected 500 with a client-safe message; `detail` stays internal.
    #[error("{message}")]
    Internal { message: String, detail: Option<String> },
    /// Anything unexpected; the payload is never shown to clients.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Reference(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidToken | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Internal { .. } | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Operational errors carry messages written for clients; unexpected
    /// ones do not.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }

    pub fn client_message(&self) -> String {
        if self.is_operational() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }

    /// Internal error text kept out of production responses.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Internal { detail, .. } => detail.as_deref(),
            Self::Unexpected(detail) => Some(detail.as_str()),
            _ => None,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::Validation(msg),
            ServiceError::NotFound(msg) => Self::NotFound(msg),
            // The service already logged the storage cause before wrapping.
            ServiceError::Db(msg) => Self::Internal { message: msg, detail: None },
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(_) => Self::Validation("Invalid input data.".into()),
            ModelError::Db(detail) => Self::Internal {
                message: "Database operation failed.".into(),
                detail: Some(detail),
            },
        }
    }
}

/// Classify storage errors: constraint violations become specific
/// operational errors, everything else a generic database failure.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::Conflict("Duplicate entry. This resource already exists.".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::Reference("Invalid reference. Related resource does not exist.".into())
            }
            _ => match err {
                DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
                    Self::NotFound("Resource not found.".into())
                }
                other => Self::Internal {
                    message: "Database operation failed.".into(),
                    detail: Some(other.to_string()),
                },
            },
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

/// Copy of the rendered error stored in response extensions so the
/// pipeline middleware can log it with request context.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub detail: Option<String>,
    pub status: StatusCode,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
    timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();
        // Internal detail is exposed only outside production
        let details = if configs::RunEnv::current().is_production() {
            None
        } else {
            self.detail().map(str::to_string)
        };

        let envelope = ErrorEnvelope {
            success: false,
            error: ErrorBody { message, details },
            timestamp: Utc::now().to_rfc3339(),
        };

        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(ErrorDetails {
            message: self.to_string(),
            detail: self.detail().map(str::to_string),
            status,
        });
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let err = ApiError::from(ServiceError::Validation("Invalid category id".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Invalid category id");

        let err = ApiError::from(ServiceError::not_found("Category"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Category not found");

        let err = ApiError::from(ServiceError::Db("Failed to fetch categories".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_operational());
        assert_eq!(err.client_message(), "Failed to fetch categories");
    }

    #[test]
    fn model_errors_map_to_invalid_input_or_db_failure() {
        let err = ApiError::from(ModelError::Validation("name required".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "Invalid input data.");

        let err = ApiError::from(ModelError::Db("connection reset".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Database operation failed.");
        assert_eq!(err.detail(), Some("connection reset"));
    }

    #[test]
    fn record_not_found_maps_to_404() {
        let err = ApiError::from(DbErr::RecordNotFound("category".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Resource not found.");
    }

    #[test]
    fn unclassified_db_errors_stay_internal() {
        let err = ApiError::from(DbErr::Custom("boom".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_operational());
        assert_eq!(err.client_message(), "Database operation failed.");
        assert!(err.detail().is_some());
    }

    #[test]
    fn token_errors_map_to_401() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        let expired = ApiError::from(Error::from(ErrorKind::ExpiredSignature));
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.client_message(), "Token expired.");

        let malformed = ApiError::from(Error::from(ErrorKind::InvalidToken));
        assert_eq!(malformed.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.client_message(), "Invalid token.");
    }

    #[test]
    fn unexpected_errors_hide_internals() {
        let err = ApiError::Unexpected("pool exploded".into());
        assert!(!err.is_operational());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.detail(), Some("pool exploded"));
    }

    #[tokio::test]
    async fn error_envelope_shape() {
        let response = ApiError::Validation("Invalid category id".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorDetails>().is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Invalid category id");
        let ts = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
