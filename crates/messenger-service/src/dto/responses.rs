//! Response DTOs handed to the UI layer
//!
//! All response DTOs implement `Serialize`.

use serde::Serialize;

use messenger_core::{ConversationKey, Profile};

/// One row of the profile directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub profile: Profile,
    /// Conversation between the caller and this profile
    pub conversation: ConversationKey,
    /// Text of the most recent message, empty when there is none
    pub last_message: String,
}
