//! API error types.

use axum::http::StatusCode;
use homestead_access::AccessError;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error enum covering all error cases.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Field validation failed.
    #[error("Validation failed")]
    ValidationError(HashMap<String, Vec<String>>),

    // 401 Unauthorized
    /// No signed-in user.
    #[error("Authentication required")]
    Unauthorized,

    /// Login refused.
    #[error("Invalid credentials")]
    InvalidCredentials,

    // 403 Forbidden
    /// Signed in, but missing a permission.
    #[error("Insufficient permissions")]
    InsufficientPermissions,

    /// Account belongs to another portal.
    #[error("{0}")]
    WrongPortal(String),

    // 404 Not Found
    /// Unknown resource.
    #[error("{0} not found")]
    NotFound(String),

    // 409 Conflict
    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    // 500 Internal Server Error
    /// Unexpected failure.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),

    // 503 Service Unavailable
    /// A backing service is down.
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) => StatusCode::BAD_REQUEST,

            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,

            Self::InsufficientPermissions | Self::WrongPortal(_) => StatusCode::FORBIDDEN,

            Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::Conflict(_) => StatusCode::CONFLICT,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get error code for client handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::ValidationError(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InsufficientPermissions => "insufficient_permissions",
            Self::WrongPortal(_) => "wrong_portal",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Check if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::UnknownPermission(key) => {
                ApiError::BadRequest(format!("Unknown permission key: {}", key))
            }
            // Unknown accounts look like bad passwords to the caller.
            AccessError::InvalidCredentials | AccessError::AccountNotFound(_) => {
                ApiError::InvalidCredentials
            }
            AccessError::SettingsUnavailable(reason) => ApiError::ServiceUnavailable(reason),
            AccessError::InvalidSetting(reason) => ApiError::BadRequest(reason),
            AccessError::ReservedRole(name) => {
                ApiError::Conflict(format!("Role {} is built in and cannot be redefined", name))
            }
            AccessError::Backend(reason) => ApiError::Internal(anyhow::anyhow!(reason)),
        }
    }
}
