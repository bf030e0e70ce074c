//! Application error types
//!
//! Unified error handling for the entire application. Each error maps to
//! how the UI layer should present it instead of a transport status code.

use messenger_core::DomainError;
use serde::Serialize;
use std::fmt;

/// How a failure is surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// Inline message next to the form that caused it
    UserMessage,
    /// Alert the user can dismiss; local state is unchanged
    DismissableAlert,
    /// Alert explaining why a feature is unavailable
    ExplanatoryAlert,
    /// Not shown, only logged
    LogOnly,
}

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    // Write errors (message send, profile update, image upload)
    #[error("Write failed: {0}")]
    WriteFailure(String),

    // Device permission errors
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Listener attach errors
    #[error("Subscription failed: {0}")]
    SubscriptionFailure(String),

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get the presentation for this error
    #[must_use]
    pub fn presentation(&self) -> Presentation {
        match self {
            Self::AuthFailure(_) | Self::Validation(_) => Presentation::UserMessage,
            Self::WriteFailure(_) => Presentation::DismissableAlert,
            Self::PermissionDenied(_) => Presentation::ExplanatoryAlert,
            Self::SubscriptionFailure(_) | Self::Config(_) | Self::Internal(_) => {
                Presentation::LogOnly
            }

            Self::Domain(e) => Self::presentation_of(e),
        }
    }

    /// Map a domain error by its classification
    #[must_use]
    pub fn presentation_of(err: &DomainError) -> Presentation {
        if err.is_auth() || err.is_validation() {
            Presentation::UserMessage
        } else if err.is_write() {
            Presentation::DismissableAlert
        } else if err.is_permission() {
            Presentation::ExplanatoryAlert
        } else {
            Presentation::LogOnly
        }
    }

    /// Get error code for notices and logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthFailure(_) => "AUTH_FAILURE",
            Self::WriteFailure(_) => "WRITE_FAILURE",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::SubscriptionFailure(_) => "SUBSCRIPTION_FAILURE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the user should see this error
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        self.presentation() != Presentation::LogOnly
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error notice handed to the UI layer
#[derive(Debug, Serialize)]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
    pub presentation: Presentation,
}

impl From<&AppError> for ErrorNotice {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            presentation: err.presentation(),
        }
    }
}

impl From<AppError> for ErrorNotice {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentations() {
        assert_eq!(
            AppError::AuthFailure("bad".to_string()).presentation(),
            Presentation::UserMessage
        );
        assert_eq!(
            AppError::WriteFailure("x".to_string()).presentation(),
            Presentation::DismissableAlert
        );
        assert_eq!(
            AppError::PermissionDenied("camera".to_string()).presentation(),
            Presentation::ExplanatoryAlert
        );
        assert_eq!(
            AppError::SubscriptionFailure("x".to_string()).presentation(),
            Presentation::LogOnly
        );
    }

    #[test]
    fn test_domain_presentations() {
        assert_eq!(
            AppError::from(DomainError::InvalidCredentials).presentation(),
            Presentation::UserMessage
        );
        assert_eq!(
            AppError::from(DomainError::write("/a", "denied")).presentation(),
            Presentation::DismissableAlert
        );
        assert_eq!(
            AppError::from(DomainError::subscribe("/a", "x")).presentation(),
            Presentation::LogOnly
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::AuthFailure("x".to_string()).error_code(), "AUTH_FAILURE");
        assert_eq!(
            AppError::from(DomainError::Disconnected).error_code(),
            "DISCONNECTED"
        );
    }

    #[test]
    fn test_is_user_visible() {
        assert!(AppError::WriteFailure("x".to_string()).is_user_visible());
        assert!(!AppError::SubscriptionFailure("x".to_string()).is_user_visible());
        assert!(!AppError::internal(anyhow::anyhow!("boom")).is_user_visible());
    }

    #[test]
    fn test_error_notice() {
        let err = AppError::WriteFailure("message not sent".to_string());
        let notice = ErrorNotice::from(&err);

        assert_eq!(notice.code, "WRITE_FAILURE");
        assert_eq!(notice.message, "Write failed: message not sent");
        assert_eq!(notice.presentation, Presentation::DismissableAlert);
    }

    #[test]
    fn test_helper_methods() {
        let err = AppError::validation("email is required");
        assert_eq!(err.to_string(), "Validation error: email is required");
    }
}
