use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use crate::application::dto::ErrorBody;
use crate::domain::errors::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Rechazo de un extractor; conserva el status elegido por axum (400, 413, 415...).
    #[error("Request rejected: {1}")]
    Rejection(StatusCode, String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rejection(status, _) => *status,
            ApiError::Domain(e) => match e {
                DomainError::InvalidInput(_) | DomainError::Decode(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::Inference(_) | DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Rejection(err.status(), err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ Petición fallida: {}", self);
        } else {
            warn!("⚠️ Petición rechazada: {}", self);
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
