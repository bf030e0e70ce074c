//! In-memory realtime database
//!
//! A shared server tree with per-client connections, change notification
//! and disconnect hooks.

mod connection;
mod registry;
mod server;
mod tree;

pub use connection::MemoryConnection;
pub use registry::{ListenerId, ListenerRegistry};
pub use server::MemoryServer;
