//! User entity - the authenticated account behind a session

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Authenticated user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: UserId,
    pub email: String,
}

impl User {
    /// Create a new User
    pub fn new(uid: UserId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
        }
    }
}
