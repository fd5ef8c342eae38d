use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::store::StoreError;

/// Failures surfaced by the catalog and user services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad or missing input. The caller should not retry unchanged.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("No product IDs left under prefix '{0}'")]
    IdsExhausted(&'static str),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// The blocking worker running the request died before answering.
    #[error("request worker failed: {0}")]
    Worker(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::DuplicateEmail | ServiceError::IdsExhausted(_) => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(_) | ServiceError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Worker(err.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServiceError::Storage(e) => {
                error!("Storage failure: {e}");
                "Request failed due to a server error.".to_string()
            }
            ServiceError::Worker(e) => {
                error!("Request worker failed: {e}");
                "Request failed due to a server error.".to_string()
            }
            other => {
                debug!("Rejected request ({status}): {other}");
                other.to_string()
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}
