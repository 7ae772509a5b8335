use thiserror::Error;
use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("No image has been loaded; export is unavailable")]
    NoImageLoaded,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Domain error occurred: {0}")]
    DomainError(#[from] DomainError),

    #[error("Infrastructure error occurred: {0}")]
    InfrastructureError(#[from] InfrastructureError),
}

impl From<tokio::task::JoinError> for ApplicationError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApplicationError::Internal(format!("background task failed: {}", err))
    }
}

// IntoResponse implementation for ApplicationError
use axum::response::{IntoResponse, Response};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

impl ApplicationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationError::NoImageLoaded => StatusCode::CONFLICT,
            ApplicationError::UploadFailed(_) => StatusCode::BAD_REQUEST,
            ApplicationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApplicationError::DomainError(DomainError::FontUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApplicationError::DomainError(_) => StatusCode::BAD_REQUEST,
            ApplicationError::InfrastructureError(infra_err) => match infra_err {
                InfrastructureError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                InfrastructureError::ImageTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                InfrastructureError::DecodingError(_)
                | InfrastructureError::Base64DecodeError(_) => StatusCode::BAD_REQUEST,
                InfrastructureError::ImageLibError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
