//! In-memory realtime server
//!
//! Holds the shared tree, the listener registry and the access rules. Every
//! client talks to it through its own [`MemoryConnection`].

use chrono::Utc;
use dashmap::DashSet;
use futures::channel::mpsc;
use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use messenger_core::{
    DomainError, ListenerGuard, PortResult, PushKey, PushKeyGenerator, Snapshot, StorePath,
    Subscription,
};

use super::connection::MemoryConnection;
use super::registry::{ListenerKind, ListenerRegistry};
use super::tree;

/// Shared in-memory realtime tree
#[derive(Clone)]
pub struct MemoryServer {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    tree: RwLock<Value>,
    registry: ListenerRegistry,
    keys: PushKeyGenerator,
    next_connection: AtomicU64,
    denied_reads: DashSet<StorePath>,
    denied_writes: DashSet<StorePath>,
}

impl MemoryServer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ServerInner {
                tree: RwLock::new(Value::Null),
                registry: ListenerRegistry::new(),
                keys: PushKeyGenerator::new(),
                next_connection: AtomicU64::new(1),
                denied_reads: DashSet::new(),
                denied_writes: DashSet::new(),
            }),
        }
    }

    /// Open a new client connection, initially online
    #[must_use]
    pub fn connect(&self) -> MemoryConnection {
        let id = self.inner.next_connection.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(connection = id, "Client connected");
        MemoryConnection::new(self.clone(), id)
    }

    /// Registry of every listener attached through any connection
    pub fn registry(&self) -> &ListenerRegistry {
        &self.inner.registry
    }

    /// Number of listeners attached exactly at `path`
    pub fn listener_count(&self, path: &StorePath) -> usize {
        self.inner.registry.listener_count(path)
    }

    /// Current value at `path`, bypassing rules
    pub fn value_at(&self, path: &StorePath) -> Value {
        tree::get(&self.inner.tree.read(), path)
    }

    // =========================================================================
    // Access rules
    // =========================================================================

    /// Reject reads and listeners at or below `prefix`
    pub fn deny_reads(&self, prefix: StorePath) {
        self.inner.denied_reads.insert(prefix);
    }

    /// Reject writes and disconnect hooks at or below `prefix`
    pub fn deny_writes(&self, prefix: StorePath) {
        self.inner.denied_writes.insert(prefix);
    }

    /// Drop every access rule
    pub fn clear_rules(&self) {
        self.inner.denied_reads.clear();
        self.inner.denied_writes.clear();
    }

    pub(crate) fn check_read(&self, path: &StorePath) -> Result<(), String> {
        if self.inner.denied_reads.iter().any(|p| path.starts_with(p.key())) {
            return Err("permission denied".to_string());
        }
        Ok(())
    }

    pub(crate) fn check_write(&self, path: &StorePath) -> PortResult<()> {
        if self.inner.denied_writes.iter().any(|p| path.starts_with(p.key())) {
            return Err(DomainError::write(path, "permission denied"));
        }
        Ok(())
    }

    // =========================================================================
    // Tree access
    // =========================================================================

    pub(crate) fn read(&self, path: &StorePath) -> Snapshot {
        Snapshot::new(path.clone(), self.value_at(path))
    }

    pub(crate) fn set(&self, path: &StorePath, value: Value) {
        self.apply(path, |root, now| tree::set(root, path, value, now));
    }

    pub(crate) fn update(&self, path: &StorePath, fields: Map<String, Value>) {
        self.apply(path, |root, now| tree::update(root, path, fields, now));
    }

    pub(crate) fn push_key(&self) -> PushKey {
        self.inner.keys.generate()
    }

    /// Apply a write and notify listeners whose value changed
    ///
    /// Notification happens under the tree lock, so every listener sees
    /// writes in the order they were applied.
    fn apply(&self, path: &StorePath, write: impl FnOnce(&mut Value, i64)) {
        let mut root = self.inner.tree.write();
        let affected = self.inner.registry.overlapping(path);
        let before: Vec<Value> = affected.iter().map(|(_, p)| tree::get(&root, p)).collect();

        write(&mut root, Utc::now().timestamp_millis());

        for ((id, listener_path), old) in affected.into_iter().zip(before) {
            let new = tree::get(&root, &listener_path);
            if new != old {
                self.inner.registry.deliver(id, Snapshot::new(listener_path, new));
            }
        }
        tracing::trace!(path = %path, "Write applied");
    }

    /// Attach a listener that first receives `initial`
    pub(crate) fn attach(
        &self,
        path: &StorePath,
        kind: ListenerKind,
        initial: impl FnOnce(&Value) -> Value,
    ) -> Subscription {
        let (sender, receiver) = mpsc::unbounded();

        // hold the tree lock so no write slips between the initial value and registration
        let root = self.inner.tree.read();
        let _ = sender.unbounded_send(Snapshot::new(path.clone(), initial(&root)));
        let id = self.inner.registry.register(path.clone(), kind, sender);
        drop(root);

        let registry = self.inner.registry.clone();
        let guard = ListenerGuard::new(path.clone(), move || registry.remove(id));
        Subscription::new(guard, receiver.boxed())
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryServer")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}
