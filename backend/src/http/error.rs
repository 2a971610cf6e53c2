//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ServiceError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input
    InvalidArgument(String),
    /// Resource not found
    NotFound(String),
    /// Caller lacks the required role
    PermissionDenied(String),
    /// Store or server failure
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            AppError::InvalidArgument(msg) => ApiError::new("INVALID_ARGUMENT", msg),
            AppError::NotFound(msg) => ApiError::new("NOT_FOUND", msg),
            AppError::PermissionDenied(msg) => ApiError::new("PERMISSION_DENIED", msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                ApiError::new("INTERNAL_ERROR", "Internal server error").with_details(msg)
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            e @ ServiceError::NotFound { .. } => AppError::NotFound(e.to_string()),
            ServiceError::PermissionDenied(msg) => AppError::PermissionDenied(msg),
            ServiceError::Internal(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::invalid("bad"), StatusCode::BAD_REQUEST),
            (
                ServiceError::not_found("team", "x"),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::PermissionDenied("admin only".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                ServiceError::Internal(RepositoryError::connection("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_not_found_message_names_entity() {
        match AppError::from(ServiceError::not_found("tournament", "t9")) {
            AppError::NotFound(msg) => assert_eq!(msg, "tournament not found: t9"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
