//! Business logic services
//!
//! This module contains the use cases behind the messenger screens: the
//! session, presence tracking, the chat stream, the directory and profile
//! editing.

pub mod auth;
pub mod chat;
pub mod context;
pub mod directory;
pub mod error;
mod listener;
pub mod presence;
pub mod profile;
pub mod session;

// Re-export all services for convenience
pub use auth::AuthService;
pub use chat::{project_display, project_messages, ChatStream};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use directory::DirectoryList;
pub use error::{ServiceError, ServiceResult};
pub use presence::{status_fields, PresenceService, PresenceTracker};
pub use profile::ProfileService;
pub use session::Session;
