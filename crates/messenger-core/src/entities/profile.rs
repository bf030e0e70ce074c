//! Profile entity - the public directory record of a user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};
use crate::value_objects::{StoreLayout, UserId};

/// Field names as stored in the tree
pub const FIELD_ID: &str = "id";
pub const FIELD_NOM: &str = "nom";
pub const FIELD_PSEUDO: &str = "pseudo";
pub const FIELD_TELEPHONE: &str = "telephone";
pub const FIELD_PROFILE_IMAGE: &str = "profileImage";
pub const FIELD_CONNECTION_STATE: &str = "connectionState";
pub const FIELD_LAST_SEEN: &str = "lastSeen";

/// Online status as written by presence tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Online,
    #[default]
    Offline,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConnectionState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(DomainError::ValidationError(format!(
                "Invalid connection state: {s}"
            ))),
        }
    }
}

/// Directory profile
///
/// The owner edits `nom`, `pseudo`, `telephone` and `profile_image`; the
/// owner's presence tracker writes `connection_state` and `last_seen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub pseudo: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub connection_state: ConnectionState,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Profile {
    /// Create an empty, offline profile for a user
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            nom: String::new(),
            pseudo: String::new(),
            telephone: String::new(),
            profile_image: None,
            connection_state: ConnectionState::Offline,
            last_seen: None,
        }
    }

    /// Decode a profile node stored under `node_key`
    ///
    /// Presence writes can create a node before the owner ever saves the
    /// profile, in which case `id` is missing and is taken from the key.
    pub fn from_node(node_key: &str, value: &Value) -> DomainResult<Self> {
        let mut object = value
            .as_object()
            .cloned()
            .ok_or_else(|| DomainError::Serialization(format!("profile {node_key} is not an object")))?;

        if !object.contains_key(FIELD_ID) {
            let id = StoreLayout::profile_id_from_key(node_key).ok_or_else(|| {
                DomainError::Serialization(format!("profile {node_key} has no id"))
            })?;
            object.insert(FIELD_ID.to_string(), Value::String(id.to_string()));
        }

        Ok(serde_json::from_value(Value::Object(object))?)
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.connection_state == ConnectionState::Online
    }

    /// Name to show in lists: pseudo, then nom, then the raw id
    pub fn display_name(&self) -> &str {
        if !self.pseudo.is_empty() {
            &self.pseudo
        } else if !self.nom.is_empty() {
            &self.nom
        } else {
            self.id.as_str()
        }
    }

    /// Whether a phone number is present to call
    pub fn has_telephone(&self) -> bool {
        !self.telephone.trim().is_empty()
    }
}
