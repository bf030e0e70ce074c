//! Store paths - addresses in the realtime key-value tree

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::{ConversationKey, UserId};
use crate::error::DomainError;

/// Characters a path segment may not contain
const FORBIDDEN_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Prefix of profile node keys (`Profil<uid>`)
pub const PROFILE_KEY_PREFIX: &str = "Profil";
/// Reserved child of a conversation holding the typing identity
pub const TYPING_KEY: &str = "typing";
/// Well-known connectivity path
pub const CONNECTED_PATH: &str = ".info/connected";

/// Slash-separated path into the realtime tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The tree root
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// The connectivity signal path (`.info/connected`)
    #[must_use]
    pub fn connected() -> Self {
        Self {
            segments: vec![".info".to_string(), "connected".to_string()],
        }
    }

    /// Parse a user-supplied path, rejecting forbidden characters
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        if path == CONNECTED_PATH {
            return Ok(Self::connected());
        }

        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        if let Some(bad) = segments.iter().find(|s| s.contains(FORBIDDEN_CHARS)) {
            return Err(DomainError::InvalidPath(format!(
                "segment {bad:?} in {path:?} contains one of . # $ [ ]"
            )));
        }

        Ok(Self { segments })
    }

    /// Append one or more segments (`"a/b"` appends two)
    #[must_use]
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(
            segment
                .as_ref()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        Self { segments }
    }

    /// Parent path, `None` at the root
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Last segment, `None` at the root
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` equals `other` or lies beneath it
    pub fn starts_with(&self, other: &StorePath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// True when one path is an ancestor of (or equal to) the other
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// Child key ordering used by order-by-key queries
///
/// Keys that parse as 32-bit integers sort first, numerically; all other keys
/// follow in lexical order.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i32>(), b.parse::<i32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Where the application keeps its collections inside the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    profiles_root: StorePath,
    discussions_root: StorePath,
}

impl StoreLayout {
    /// Create a layout from two root paths
    pub fn new(profiles_root: &str, discussions_root: &str) -> Result<Self, DomainError> {
        Ok(Self {
            profiles_root: StorePath::parse(profiles_root)?,
            discussions_root: StorePath::parse(discussions_root)?,
        })
    }

    /// Collection of all profiles
    pub fn profiles(&self) -> &StorePath {
        &self.profiles_root
    }

    /// Node of one user's profile
    pub fn profile(&self, user_id: &UserId) -> StorePath {
        self.profiles_root
            .child(format!("{PROFILE_KEY_PREFIX}{user_id}"))
    }

    /// Node of one conversation
    pub fn conversation(&self, key: &ConversationKey) -> StorePath {
        self.discussions_root.child(key.as_str())
    }

    /// Typing child of a conversation
    pub fn typing(&self, key: &ConversationKey) -> StorePath {
        self.conversation(key).child(TYPING_KEY)
    }

    /// Recover the user id from a profile node key (`Profil<uid>`)
    pub fn profile_id_from_key(key: &str) -> Option<&str> {
        key.strip_prefix(PROFILE_KEY_PREFIX).filter(|id| !id.is_empty())
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            profiles_root: StorePath::root().child("ProfilsTable"),
            discussions_root: StorePath::root().child("TheDiscussions"),
        }
    }
}
