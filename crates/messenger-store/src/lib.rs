//! # messenger-store
//!
//! In-memory infrastructure behind the domain ports.
//!
//! ## Features
//!
//! - **Realtime tree**: shared server, per-client connections, `value`
//!   listeners, disconnect hooks and the `.info/connected` signal
//! - **Object storage**: buckets with upsert and public URLs
//! - **Auth provider**: email/password accounts hashed with Argon2
//! - **Media source**: scripted permissions and image picks
//!
//! ## Example
//!
//! ```ignore
//! use messenger_store::MemoryServer;
//!
//! let server = MemoryServer::new();
//! let alice = server.connect();
//! let bob = server.connect();
//!
//! // Bob listens, Alice writes
//! let subscription = bob.subscribe(&path)?;
//! alice.set(&path, json!("hello")).await?;
//!
//! // Dropping Alice's connection applies her disconnect hooks
//! alice.go_offline();
//! ```

pub mod auth_provider;
pub mod media;
pub mod object_store;
pub mod realtime;

pub use auth_provider::MemoryAuthProvider;
pub use media::ScriptedMediaSource;
pub use object_store::{MemoryObjectStore, StoredObject};
pub use realtime::{ListenerId, ListenerRegistry, MemoryConnection, MemoryServer};
