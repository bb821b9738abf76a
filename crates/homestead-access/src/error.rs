//! Access error types.

use thiserror::Error;

/// Result type for access operations.
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised by the access core and its collaborators.
///
/// None of these are fatal: guards turn authentication problems into
/// redirects and the timeout monitor turns settings failures into defaults.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Key outside the permission catalog.
    #[error("Unknown permission key: {0}")]
    UnknownPermission(String),

    /// Wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No account with that email.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Settings backend did not answer.
    #[error("Settings unavailable: {0}")]
    SettingsUnavailable(String),

    /// Setting value out of range.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Built-in role cannot carry a permission set.
    #[error("Role cannot be redefined: {0}")]
    ReservedRole(String),

    /// Authentication backend failure.
    #[error("Authentication backend error: {0}")]
    Backend(String),
}
