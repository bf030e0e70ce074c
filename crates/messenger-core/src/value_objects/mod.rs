//! Value objects - immutable types that represent domain concepts

mod conversation_key;
mod push_key;
mod store_path;
mod user_id;

pub use conversation_key::ConversationKey;
pub use push_key::{PushKey, PushKeyGenerator};
pub use store_path::{
    compare_keys, StoreLayout, StorePath, CONNECTED_PATH, PROFILE_KEY_PREFIX, TYPING_KEY,
};
pub use user_id::UserId;
