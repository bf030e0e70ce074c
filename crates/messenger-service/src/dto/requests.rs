//! Request DTOs for the UI-facing use cases
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::{Validate, ValidationError};

// ============================================================================
// Auth Requests
// ============================================================================

/// Sign-in form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(custom(
        function = "not_blank",
        message = "Please fill in both email and password"
    ))]
    pub email: String,

    #[validate(custom(
        function = "not_blank",
        message = "Please fill in both email and password"
    ))]
    pub password: String,
}

impl SignInRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Sign-up form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password should be at least 6 characters"))]
    pub password: String,
}

impl SignUpRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// ============================================================================
// Profile Requests
// ============================================================================

/// Editable profile fields
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveProfileRequest {
    #[validate(custom(function = "not_blank", message = "Please fill in all fields"))]
    pub nom: String,

    #[validate(custom(function = "not_blank", message = "Please fill in all fields"))]
    pub pseudo: String,

    #[validate(custom(function = "not_blank", message = "Please fill in all fields"))]
    pub telephone: String,
}

impl SaveProfileRequest {
    pub fn new(
        nom: impl Into<String>,
        pseudo: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            nom: nom.into(),
            pseudo: pseudo.into(),
            telephone: telephone.into(),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
