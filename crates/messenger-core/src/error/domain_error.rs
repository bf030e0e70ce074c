//! Domain errors - error types for the domain layer and its ports

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Identity & Addressing Errors
    // =========================================================================
    #[error("User identity must not be empty")]
    EmptyIdentity,

    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("No user is signed in")]
    NotSignedIn,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Realtime Store Errors
    // =========================================================================
    #[error("Write to {path} rejected: {reason}")]
    StoreWrite { path: String, reason: String },

    #[error("Read of {path} failed: {reason}")]
    StoreRead { path: String, reason: String },

    #[error("Listener on {path} could not be attached: {reason}")]
    SubscribeFailed { path: String, reason: String },

    #[error("Client is offline")]
    Disconnected,

    // =========================================================================
    // Object Storage Errors
    // =========================================================================
    #[error("Object storage error: {0}")]
    ObjectStore(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // =========================================================================
    // Media Errors
    // =========================================================================
    #[error("Access to the {0} was denied")]
    MediaPermissionDenied(String),

    // =========================================================================
    // Data Errors
    // =========================================================================
    #[error("Malformed data: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Shorthand for a rejected store write
    pub fn write(path: impl ToString, reason: impl ToString) -> Self {
        Self::StoreWrite {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a failed store read
    pub fn read(path: impl ToString, reason: impl ToString) -> Self {
        Self::StoreRead {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a listener that could not be attached
    pub fn subscribe(path: impl ToString, reason: impl ToString) -> Self {
        Self::SubscribeFailed {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get an error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyIdentity => "EMPTY_IDENTITY",
            Self::InvalidPath(_) => "INVALID_PATH",

            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::NotSignedIn => "NOT_SIGNED_IN",

            Self::ValidationError(_) => "VALIDATION_ERROR",

            Self::StoreWrite { .. } => "STORE_WRITE_FAILED",
            Self::StoreRead { .. } => "STORE_READ_FAILED",
            Self::SubscribeFailed { .. } => "SUBSCRIBE_FAILED",
            Self::Disconnected => "DISCONNECTED",

            Self::ObjectStore(_) => "OBJECT_STORE_ERROR",
            Self::ObjectNotFound(_) => "OBJECT_NOT_FOUND",

            Self::MediaPermissionDenied(_) => "PERMISSION_DENIED",

            Self::Serialization(_) => "MALFORMED_DATA",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::EmailAlreadyExists
                | Self::InvalidEmail
                | Self::WeakPassword(_)
                | Self::NotSignedIn
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_) | Self::EmptyIdentity | Self::InvalidPath(_)
        )
    }

    /// Check if this error came from a write (store or object storage)
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::StoreWrite { .. } | Self::ObjectStore(_) | Self::ObjectNotFound(_)
        )
    }

    /// Check if this error came from attaching a listener
    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::SubscribeFailed { .. })
    }

    /// Check if this is a device permission error
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::MediaPermissionDenied(_))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
