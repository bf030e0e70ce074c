//! Ports - the external collaborators the application layer depends on
//!
//! The domain defines what it needs from the realtime store, the object
//! store, the auth provider and the device media picker; infrastructure
//! crates provide the implementations.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

use super::snapshot::{Snapshot, Subscription};
use crate::entities::User;
use crate::error::DomainError;
use crate::value_objects::{PushKey, StorePath};

/// Result type for port operations
pub type PortResult<T> = Result<T, DomainError>;

// ============================================================================
// Realtime Store
// ============================================================================

/// Path-addressed reactive key-value tree
///
/// One value is one connection: disconnect hooks belong to the connection
/// that registered them.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// One-shot read of a node
    async fn once(&self, path: &StorePath) -> PortResult<Snapshot>;

    /// One-shot read of the last `limit` children ordered by key
    async fn last_children(&self, path: &StorePath, limit: usize) -> PortResult<Vec<Snapshot>>;

    /// Replace a node; `Value::Null` deletes it
    async fn set(&self, path: &StorePath, value: Value) -> PortResult<()>;

    /// Merge fields into a node; null fields are deleted
    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> PortResult<()>;

    /// Generate a fresh, chronologically ordered child key
    fn push_key(&self) -> PushKey;

    /// Attach a continuous `value` listener
    fn subscribe(&self, path: &StorePath) -> PortResult<Subscription>;

    /// Register a field merge the server applies when this connection drops
    async fn on_disconnect_update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> PortResult<()>;

    /// Cancel the disconnect hooks registered at `path`
    async fn cancel_on_disconnect(&self, path: &StorePath) -> PortResult<()>;
}

// ============================================================================
// Object Store
// ============================================================================

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a blob under `key`; with `upsert` an existing object is replaced
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> PortResult<()>;

    /// Stable public URL of an uploaded object
    fn public_url(&self, bucket: &str, key: &str) -> PortResult<String>;
}

// ============================================================================
// Auth Provider
// ============================================================================

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<User>;

    /// Create an account; the new user is signed in
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<User>;

    /// End the provider session of a user
    async fn sign_out(&self, user: &User) -> PortResult<()>;
}

// ============================================================================
// Media Source
// ============================================================================

/// Where a profile image comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Pick from the media library
    Library,
    /// Capture with the camera
    Camera,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Library => "media library",
            Self::Camera => "camera",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image picked or captured on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MediaAsset {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }
}

#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Ask the user for access; `false` means refused
    async fn request_permission(&self, kind: MediaKind) -> bool;

    /// Pick or capture an image; `None` when the user cancels
    async fn acquire(&self, kind: MediaKind) -> PortResult<Option<MediaAsset>>;
}
