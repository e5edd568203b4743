//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Account not found (by login or email)
    #[error("Account not found")]
    AccountNotFound,

    /// Login already registered
    #[error("Login is already taken")]
    LoginTaken,

    /// Email already registered
    #[error("Email is already registered")]
    EmailTaken,

    /// Input field failed validation
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Confirmation code unknown
    #[error("Confirmation code is incorrect")]
    ConfirmationCodeInvalid,

    /// Email already confirmed
    #[error("Email is already confirmed")]
    AlreadyConfirmed,

    /// Confirmation code expired
    #[error("Confirmation code has expired")]
    ConfirmationCodeExpired,

    /// No account for the given email (confirmation resend)
    #[error("Email is not registered")]
    EmailUnknown,

    /// Email not confirmed yet (login attempt)
    #[error("Email is not confirmed")]
    EmailNotConfirmed,

    /// Password comparison failed
    #[error("Password is incorrect")]
    WrongPassword,

    /// Recovery code unknown, mismatched, or expired
    #[error("Recovery code is incorrect or expired")]
    RecoveryCodeInvalid,

    /// Refresh/access credential missing, invalid, expired, or stale
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but the resource belongs to another user
    #[error("Forbidden")]
    Forbidden,

    /// Device session not found
    #[error("Device session not found")]
    SessionNotFound,

    /// Request rate exceeded for this client
    #[error("Too many requests")]
    TooManyRequests,

    /// Email dispatch failed on an awaited send
    #[error("Failed to send email")]
    EmailDispatch(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AccountNotFound | AuthError::SessionNotFound => StatusCode::NOT_FOUND,
            AuthError::LoginTaken
            | AuthError::EmailTaken
            | AuthError::Validation { .. }
            | AuthError::ConfirmationCodeInvalid
            | AuthError::AlreadyConfirmed
            | AuthError::ConfirmationCodeExpired
            | AuthError::EmailUnknown
            | AuthError::EmailNotConfirmed
            | AuthError::WrongPassword
            | AuthError::RecoveryCodeInvalid => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::EmailDispatch(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AccountNotFound | AuthError::SessionNotFound => ErrorKind::NotFound,
            AuthError::LoginTaken
            | AuthError::EmailTaken
            | AuthError::Validation { .. }
            | AuthError::ConfirmationCodeInvalid
            | AuthError::AlreadyConfirmed
            | AuthError::ConfirmationCodeExpired
            | AuthError::EmailUnknown
            | AuthError::EmailNotConfirmed
            | AuthError::WrongPassword
            | AuthError::RecoveryCodeInvalid => ErrorKind::BadRequest,
            AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::TooManyRequests => ErrorKind::TooManyRequests,
            AuthError::EmailDispatch(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// The input field this error is scoped to, if any
    ///
    /// Reflected in the `errorsMessages[].field` of the response body.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AuthError::LoginTaken => Some("login"),
            AuthError::EmailTaken | AuthError::EmailUnknown | AuthError::EmailNotConfirmed => {
                Some("email")
            }
            AuthError::Validation { field, .. } => Some(field),
            AuthError::ConfirmationCodeInvalid
            | AuthError::AlreadyConfirmed
            | AuthError::ConfirmationCodeExpired => Some("code"),
            AuthError::WrongPassword => Some("password"),
            AuthError::RecoveryCodeInvalid => Some("recoveryCode"),
            _ => None,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self.field() {
            Some(field) => err.with_field(field),
            None => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::EmailDispatch(msg) => {
                tracing::error!(message = %msg, "Email dispatch failed");
            }
            AuthError::WrongPassword | AuthError::Unauthorized => {
                tracing::warn!(error = %self, "Rejected credential");
            }
            AuthError::TooManyRequests => {
                tracing::warn!("Rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::token::TokenError> for AuthError {
    fn from(_: platform::token::TokenError) -> Self {
        AuthError::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::AccountNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AuthError::LoginTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::TooManyRequests.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_field_scoping() {
        assert_eq!(AuthError::LoginTaken.field(), Some("login"));
        assert_eq!(AuthError::EmailTaken.field(), Some("email"));
        assert_eq!(AuthError::RecoveryCodeInvalid.field(), Some("recoveryCode"));
        assert_eq!(AuthError::Unauthorized.field(), None);
    }

    #[test]
    fn test_to_app_error_carries_field() {
        let app = AuthError::RecoveryCodeInvalid.to_app_error();
        assert_eq!(app.field(), Some("recoveryCode"));
        assert_eq!(app.status_code(), 400);
    }
}
