use thiserror::Error;

/// Failures the service layer hands to the HTTP boundary. Messages are
/// written for clients; storage detail is logged where the failure is
/// caught, never carried here.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }
}
