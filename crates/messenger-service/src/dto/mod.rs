//! Data transfer objects for the UI-facing use cases
//!
//! This module provides:
//! - Request DTOs with validation for form inputs
//! - Response DTOs for what the engines publish

pub mod requests;
pub mod responses;

pub use requests::{SaveProfileRequest, SignInRequest, SignUpRequest};
pub use responses::DirectoryEntry;
