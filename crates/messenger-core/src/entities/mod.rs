//! Domain entities - core business objects

mod display_item;
mod message;
mod profile;
mod typing;
mod user;

pub use display_item::{newest_first, with_date_separators, DisplayItem};
pub use message::Message;
pub use profile::{
    ConnectionState, Profile, FIELD_CONNECTION_STATE, FIELD_ID, FIELD_LAST_SEEN, FIELD_NOM,
    FIELD_PROFILE_IMAGE, FIELD_PSEUDO, FIELD_TELEPHONE,
};
pub use typing::typing_active;
pub use user::User;
