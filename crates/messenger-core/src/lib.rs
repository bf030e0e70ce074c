//! # messenger-core
//!
//! Domain layer containing entities, value objects, domain errors, and the
//! ports the application layer talks to (realtime store, object store, auth
//! provider, media source).
//! This crate has zero dependencies on infrastructure.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    newest_first, typing_active, with_date_separators, ConnectionState, DisplayItem, Message,
    Profile, User,
};
pub use error::{DomainError, DomainResult};
pub use traits::{
    is_server_timestamp, server_timestamp, AuthProvider, ListenerGuard, MediaAsset, MediaKind,
    MediaSource, ObjectStore, PortResult, RealtimeStore, Snapshot, Subscription,
};
pub use value_objects::{
    compare_keys, ConversationKey, PushKey, PushKeyGenerator, StoreLayout, StorePath, UserId,
};
