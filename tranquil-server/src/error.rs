//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.
//! Every error is rendered as `{ "success": false, "error": CODE, "message": ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tranquil_core::CoreError;

use crate::db::StoreError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized - missing or invalid authentication
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden - authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict - resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required service is not configured or available
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Authentication error with specific error code
    #[error("{message}")]
    AuthError { message: String, code: String },

    /// Domain rule violation from tranquil-core
    #[error("Domain error: {0}")]
    Core(#[from] CoreError),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Create an authentication error with a specific error code
    pub fn auth_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthError {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::AuthError { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(ref e) => match e {
                CoreError::UnknownVariant { .. }
                | CoreError::ScoreOutOfRange { .. }
                | CoreError::MalformedBackupCode => StatusCode::BAD_REQUEST,
                CoreError::Entropy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(ref e) => match e {
                StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::Migration(_) | StoreError::Query(_) | StoreError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::AuthError { code, .. } => code,
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Core(ref e) => match e {
                CoreError::UnknownVariant { .. } => "INVALID_INPUT",
                CoreError::ScoreOutOfRange { .. } => "INVALID_SCORE",
                CoreError::MalformedBackupCode => "INVALID_BACKUP_CODE",
                CoreError::Entropy(_) => "ENTROPY_ERROR",
            },
            Self::Store(ref e) => match e {
                StoreError::Conflict(_) => "CONFLICT",
                StoreError::Connection(_) => "DATABASE_UNAVAILABLE",
                _ => "DATABASE_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Core(CoreError::Entropy(_)) => "Failed to generate a secure credential".to_string(),
            Self::Core(ref e) => e.to_string(),
            Self::Store(StoreError::Conflict(message)) => message.clone(),
            Self::Store(StoreError::Connection(_)) => "Database temporarily unavailable".to_string(),
            Self::Store(_) => "A database error occurred".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::AuthError { message, .. } => message.clone(),
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::AuthError { .. } => "auth_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Core(_) => "domain",
            Self::Store(_) => "storage",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code().to_string();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = %code,
                error = %internal_message,
                "Server error"
            );
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(
                status = %status,
                category = category,
                code = %code,
                error = %internal_message,
                "Authentication error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = %code,
                error = %internal_message,
                "Client error"
            );
        }

        let body = serde_json::json!({
            "success": false,
            "error": code,
            "message": client_message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::auth_error("AUTH_TOKEN_EXPIRED", "expired").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StoreError::Conflict("taken".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CoreError::MalformedBackupCode).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_exposes_its_code() {
        let err = ApiError::auth_error("AUTH_MISSING_TOKEN", "Missing Authorization header");
        assert_eq!(err.error_code(), "AUTH_MISSING_TOKEN");
    }

    #[test]
    fn test_database_details_are_not_leaked() {
        let err = ApiError::from(StoreError::Query(
            "relation \"users\" does not exist".to_string(),
        ));
        assert_eq!(err.client_message(), "A database error occurred");

        let err = ApiError::internal("panic at src/handlers/auth.rs:42");
        assert_eq!(err.client_message(), "An internal error occurred");
    }

    #[tokio::test]
    async fn test_error_envelope_shape() {
        let response = ApiError::not_found("Device not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "NOT_FOUND");
        assert_eq!(json["message"], "Not found: Device not found");
    }
}
