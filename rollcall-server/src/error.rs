//! Error types for rollcall-server
//!
//! Every handler failure renders as `{"error": message}` with the status
//! mapped from the error kind.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rollcall_common::api::ErrorResponse;
use rollcall_common::ExportKind;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field (400)
    #[error("{0}")]
    Validation(String),

    /// Identifier has no directory record (404)
    #[error("{0}")]
    NotFound(String),

    /// Directory lookup failed (500); details are logged, not returned
    #[error("Failed to fetch student data")]
    Upstream(String),

    /// State changed under the request; the caller should retry (409)
    #[error("{0}")]
    Conflict(String),

    /// Nothing to export (400)
    #[error("No {0} records to export")]
    EmptyExport(ExportKind),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::EmptyExport(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<rollcall_common::Error> for ApiError {
    fn from(err: rollcall_common::Error) -> Self {
        use rollcall_common::Error;
        match err {
            Error::Validation(msg) => ApiError::Validation(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Upstream(msg) => ApiError::Upstream(msg),
            Error::EmptyExport(kind) => ApiError::EmptyExport(kind),
            Error::Io(e) => ApiError::Io(e),
            Error::Json(e) => ApiError::Internal(e.to_string()),
            Error::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "Request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Upstream("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::EmptyExport(ExportKind::Attendance).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_details_are_not_exposed() {
        let err = ApiError::Upstream("status 502: <html>secret</html>".into());
        assert_eq!(err.to_string(), "Failed to fetch student data");
    }

    #[test]
    fn test_common_errors_convert() {
        let err: ApiError = rollcall_common::Error::EmptyExport(ExportKind::Registered).into();
        assert_eq!(err.to_string(), "No registered roster records to export");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
