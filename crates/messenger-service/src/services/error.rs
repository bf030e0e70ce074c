//! Service layer error types
//!
//! Provides a unified error type for all service operations. Each variant
//! maps onto the application error taxonomy, which decides how the UI
//! presents it.

use messenger_common::{AppError, Presentation};
use messenger_core::DomainError;
use std::fmt;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Domain rule violation
    Domain(DomainError),

    /// Application error (config, validation, etc.)
    App(AppError),

    /// Sign-in or sign-up rejected
    AuthFailure(String),

    /// A user-initiated write did not go through
    WriteFailure {
        operation: &'static str,
        reason: String,
    },

    /// Camera or media-library access refused
    PermissionDenied { media: String },

    /// A listener could not be attached
    SubscriptionFailure { path: String, reason: String },

    /// Operation requires a signed-in user
    NotSignedIn,

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::App(e) => write!(f, "{e}"),
            Self::AuthFailure(msg) => write!(f, "Authentication failed: {msg}"),
            Self::WriteFailure { operation, reason } => {
                write!(f, "Could not {operation}: {reason}")
            }
            Self::PermissionDenied { media } => {
                write!(f, "Permission to access the {media} is required")
            }
            Self::SubscriptionFailure { path, reason } => {
                write!(f, "Could not listen to {path}: {reason}")
            }
            Self::NotSignedIn => write!(f, "No user is signed in"),
            Self::Validation(msg) => write!(f, "{msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::App(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create an auth failure from a provider error
    pub fn auth_failure(err: impl fmt::Display) -> Self {
        Self::AuthFailure(err.to_string())
    }

    /// Create a write failure for a named operation
    pub fn write_failure(operation: &'static str, err: impl fmt::Display) -> Self {
        Self::WriteFailure {
            operation,
            reason: err.to_string(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(media: impl fmt::Display) -> Self {
        Self::PermissionDenied {
            media: media.to_string(),
        }
    }

    /// Create a subscription failure from a store error
    pub fn subscription_failure(path: impl fmt::Display, err: impl fmt::Display) -> Self {
        Self::SubscriptionFailure {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// How the UI should surface this error
    pub fn presentation(&self) -> Presentation {
        match self {
            Self::Domain(e) => AppError::presentation_of(e),
            Self::App(e) => e.presentation(),
            Self::AuthFailure(_) | Self::NotSignedIn | Self::Validation(_) => {
                Presentation::UserMessage
            }
            Self::WriteFailure { .. } => Presentation::DismissableAlert,
            Self::PermissionDenied { .. } => Presentation::ExplanatoryAlert,
            Self::SubscriptionFailure { .. } | Self::Internal(_) => Presentation::LogOnly,
        }
    }

    /// Get the error code for notices and logs
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::AuthFailure(_) => "AUTH_FAILURE",
            Self::WriteFailure { .. } => "WRITE_FAILURE",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::SubscriptionFailure { .. } => "SUBSCRIPTION_FAILURE",
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    #[inline]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. })
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<AppError> for ServiceError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| errors.to_string());
        Self::Validation(message)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::AuthFailure(msg) => AppError::AuthFailure(msg),
            err @ ServiceError::WriteFailure { .. } => AppError::WriteFailure(err.to_string()),
            ServiceError::PermissionDenied { media } => AppError::PermissionDenied(media),
            err @ ServiceError::SubscriptionFailure { .. } => {
                AppError::SubscriptionFailure(err.to_string())
            }
            ServiceError::NotSignedIn => AppError::AuthFailure("not signed in".to_string()),
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
