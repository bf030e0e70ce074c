//! Listener registry
//!
//! Tracks every attached `value` listener using DashMap for thread-safe
//! access. Connectivity listeners are tied to the connection that attached
//! them; tree listeners see every write.

use dashmap::DashMap;
use futures::channel::mpsc::UnboundedSender;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use messenger_core::{Snapshot, StorePath};

/// Identifier of one attached listener
pub type ListenerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListenerKind {
    Tree,
    Connected { connection: u64 },
}

struct Listener {
    path: StorePath,
    kind: ListenerKind,
    sender: UnboundedSender<Snapshot>,
}

/// Registry of attached listeners, cheap to clone
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<DashMap<ListenerId, Listener>>,
    next_id: Arc<AtomicU64>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(
        &self,
        path: StorePath,
        kind: ListenerKind,
        sender: UnboundedSender<Snapshot>,
    ) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(listener = id, path = %path, "Listener attached");
        self.listeners.insert(id, Listener { path, kind, sender });
        id
    }

    /// Detach a listener; unknown ids are ignored
    pub fn remove(&self, id: ListenerId) {
        if let Some((_, listener)) = self.listeners.remove(&id) {
            listener.sender.close_channel();
            tracing::trace!(listener = id, path = %listener.path, "Listener detached");
        }
    }

    /// Number of listeners attached exactly at `path`
    pub fn listener_count(&self, path: &StorePath) -> usize {
        self.listeners.iter().filter(|l| &l.path == path).count()
    }

    /// Total number of attached listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Tree listeners whose path overlaps a write at `changed`
    pub(crate) fn overlapping(&self, changed: &StorePath) -> Vec<(ListenerId, StorePath)> {
        self.listeners
            .iter()
            .filter(|l| l.kind == ListenerKind::Tree && l.path.overlaps(changed))
            .map(|l| (*l.key(), l.path.clone()))
            .collect()
    }

    /// Deliver a snapshot to one listener, dropping it when its stream is gone
    pub(crate) fn deliver(&self, id: ListenerId, snapshot: Snapshot) {
        let closed = match self.listeners.get(&id) {
            Some(listener) => listener.sender.unbounded_send(snapshot).is_err(),
            None => false,
        };
        if closed {
            self.remove(id);
        }
    }

    /// Deliver the connectivity flag to the listeners of one connection
    pub(crate) fn deliver_connected(&self, connection: u64, connected: bool) {
        let targets: Vec<(ListenerId, StorePath)> = self
            .listeners
            .iter()
            .filter(|l| l.kind == ListenerKind::Connected { connection })
            .map(|l| (*l.key(), l.path.clone()))
            .collect();

        for (id, path) in targets {
            self.deliver(id, Snapshot::new(path, connected.into()));
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
