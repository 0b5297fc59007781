//! Error types for the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use crucible_core::SandboxError;

/// Result type alias for handler operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to HTTP callers. Client errors keep their message;
/// server faults are reported generically and logged in full, so internal
/// paths never reach the response body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Internal server error")]
    Internal(#[source] SandboxError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::InvalidRequest(_)
            | ApiError::UnsupportedLanguage(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "missing_field",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::UnsupportedLanguage(_) => "unsupported_language",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::UnsupportedLanguage(lang) => ApiError::UnsupportedLanguage(lang),
            SandboxError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            log::error!("request failed with server fault: {}", source);
        }
        let body = Json(json!({
            "error": self.to_string(),
            "error_type": self.error_type(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            ApiError::MissingField("code").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UnsupportedLanguage("cobol".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn server_faults_map_to_500_without_detail() {
        let err: ApiError = SandboxError::Launch("image 'x' not available".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn sandbox_client_errors_keep_their_classification() {
        let err: ApiError = SandboxError::UnsupportedLanguage("cobol".into()).into();
        assert_eq!(err.error_type(), "unsupported_language");
    }
}
