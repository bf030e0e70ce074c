//! Canonical conversation key for a pair of users
//!
//! Both participants compute the key on their own device and land on the same
//! store node without any handshake, so the derivation must be symmetric.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

/// Key of the store node holding a one-to-one conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Resolve the key for an unordered pair: the greater id goes first
    pub fn resolve(a: &UserId, b: &UserId) -> Self {
        let (first, second) = if a > b { (a, b) } else { (b, a) };
        Self(format!("{first}{second}"))
    }

    /// Get the key as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConversationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
