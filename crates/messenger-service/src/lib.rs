//! # messenger-service
//!
//! Application layer containing the session, presence, chat stream,
//! directory and profile use cases, plus their DTOs.

pub mod dto;
pub mod services;

#[cfg(test)]
mod test_support;

pub use dto::{DirectoryEntry, SaveProfileRequest, SignInRequest, SignUpRequest};
pub use services::{
    AuthService, ChatStream, DirectoryList, PresenceService, PresenceTracker, ProfileService,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult, Session,
};
