//! Client connection to the in-memory server
//!
//! Each connection owns its connectivity flag and its disconnect hooks.
//! Going offline applies the hooks on the server, the way a hosted database
//! does when a client socket drops.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use messenger_core::{
    DomainError, PortResult, PushKey, RealtimeStore, Snapshot, StorePath, Subscription,
};

use super::registry::ListenerKind;
use super::server::MemoryServer;

/// Field merge registered to run when the connection drops
#[derive(Debug, Clone)]
struct DisconnectHook {
    path: StorePath,
    fields: Map<String, Value>,
}

/// One client's view of a [`MemoryServer`]
#[derive(Clone)]
pub struct MemoryConnection {
    server: MemoryServer,
    id: u64,
    state: Arc<ClientState>,
}

struct ClientState {
    connected: AtomicBool,
    hooks: Mutex<Vec<DisconnectHook>>,
}

impl MemoryConnection {
    pub(crate) fn new(server: MemoryServer, id: u64) -> Self {
        Self {
            server,
            id,
            state: Arc::new(ClientState {
                connected: AtomicBool::new(true),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Number of disconnect hooks currently registered
    pub fn pending_hooks(&self) -> usize {
        self.state.hooks.lock().len()
    }

    /// Drop the connection: the server applies the disconnect hooks
    pub fn go_offline(&self) {
        if !self.state.connected.swap(false, Ordering::SeqCst) {
            return;
        }

        let hooks = std::mem::take(&mut *self.state.hooks.lock());
        tracing::debug!(connection = self.id, hooks = hooks.len(), "Client disconnected");
        for hook in hooks {
            self.server.update(&hook.path, hook.fields);
        }

        self.server.registry().deliver_connected(self.id, false);
    }

    /// Re-establish the connection
    pub fn go_online(&self) {
        if self.state.connected.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::debug!(connection = self.id, "Client reconnected");
        self.server.registry().deliver_connected(self.id, true);
    }

    fn ensure_connected(&self) -> PortResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DomainError::Disconnected)
        }
    }
}

#[async_trait]
impl RealtimeStore for MemoryConnection {
    async fn once(&self, path: &StorePath) -> PortResult<Snapshot> {
        self.server
            .check_read(path)
            .map_err(|reason| DomainError::read(path, reason))?;

        if path == &StorePath::connected() {
            return Ok(Snapshot::new(path.clone(), self.is_connected().into()));
        }

        self.ensure_connected()?;
        Ok(self.server.read(path))
    }

    async fn last_children(&self, path: &StorePath, limit: usize) -> PortResult<Vec<Snapshot>> {
        let mut children = self.once(path).await?.children();
        let skip = children.len().saturating_sub(limit);
        Ok(children.split_off(skip))
    }

    async fn set(&self, path: &StorePath, value: Value) -> PortResult<()> {
        self.ensure_connected()?;
        self.server.check_write(path)?;
        self.server.set(path, value);
        Ok(())
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> PortResult<()> {
        self.ensure_connected()?;
        self.server.check_write(path)?;
        self.server.update(path, fields);
        Ok(())
    }

    fn push_key(&self) -> PushKey {
        self.server.push_key()
    }

    fn subscribe(&self, path: &StorePath) -> PortResult<Subscription> {
        self.server
            .check_read(path)
            .map_err(|reason| DomainError::subscribe(path, reason))?;

        if path == &StorePath::connected() {
            let connected = self.is_connected();
            return Ok(self.server.attach(
                path,
                ListenerKind::Connected { connection: self.id },
                |_| connected.into(),
            ));
        }

        let listener_path = path.clone();
        Ok(self
            .server
            .attach(path, ListenerKind::Tree, move |root| {
                super::tree::get(root, &listener_path)
            }))
    }

    async fn on_disconnect_update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> PortResult<()> {
        self.ensure_connected()?;
        self.server.check_write(path)?;
        self.state.hooks.lock().push(DisconnectHook {
            path: path.clone(),
            fields,
        });
        Ok(())
    }

    async fn cancel_on_disconnect(&self, path: &StorePath) -> PortResult<()> {
        self.state
            .hooks
            .lock()
            .retain(|hook| !hook.path.starts_with(path));
        Ok(())
    }
}

impl std::fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
