//! API error handling.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Reasons a webhook request is rejected. The display text is the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing signature")]
    MissingSignature,

    #[error("Repository not configured")]
    UnknownRepository,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Deployment already in progress")]
    AlreadyDeploying,

    /// Detail is logged, never sent to the caller.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingSignature => StatusCode::UNAUTHORIZED,
            ApiError::UnknownRepository => StatusCode::BAD_REQUEST,
            ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::AlreadyDeploying => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "Error processing webhook");
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<dockhook_deployer::DeployError> for ApiError {
    fn from(err: dockhook_deployer::DeployError) -> Self {
        match err {
            dockhook_deployer::DeployError::AlreadyDeploying(_) => ApiError::AlreadyDeploying,
            dockhook_deployer::DeployError::UnknownRepository(_) => ApiError::UnknownRepository,
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
