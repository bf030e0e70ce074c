//! Snapshots and subscriptions - what the realtime store hands back

use futures::stream::BoxStream;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;

use crate::error::DomainError;
use crate::value_objects::{compare_keys, StorePath};

/// Key of the server-value placeholder object
pub const SERVER_VALUE_KEY: &str = ".sv";

/// Placeholder resolved to the server's clock (epoch millis) when a write is applied
pub fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

/// Check whether a value is the server timestamp placeholder
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.get(SERVER_VALUE_KEY) == Some(&json!("timestamp")))
}

/// Immutable view of a node at the time it was read
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: StorePath,
    value: Value,
}

impl Snapshot {
    #[must_use]
    pub fn new(path: StorePath, value: Value) -> Self {
        Self { path, value }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Key of the node, `None` at the root
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// A node exists when it holds anything other than null
    #[inline]
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Child snapshots ordered by key
    pub fn children(&self) -> Vec<Snapshot> {
        let Some(object) = self.value.as_object() else {
            return Vec::new();
        };

        let mut keys: Vec<&String> = object.keys().collect();
        keys.sort_by(|a, b| compare_keys(a, b));
        keys.into_iter()
            .map(|k| Snapshot::new(self.path.child(k), object[k].clone()))
            .collect()
    }

    /// Snapshot of a direct or nested child (null when absent)
    pub fn child(&self, key: &str) -> Snapshot {
        let path = self.path.child(key);
        let value = key
            .split('/')
            .filter(|s| !s.is_empty())
            .try_fold(&self.value, |node, segment| node.get(segment))
            .cloned()
            .unwrap_or(Value::Null);
        Snapshot::new(path, value)
    }

    /// Decode the node into a typed value
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            DomainError::Serialization(format!("{}: {e}", self.path))
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

type DetachFn = Box<dyn FnOnce() + Send + Sync>;

/// Keeps a listener attached; dropping it detaches synchronously
pub struct ListenerGuard {
    path: StorePath,
    detach: Option<DetachFn>,
}

impl ListenerGuard {
    #[must_use]
    pub fn new(path: StorePath, detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            path,
            detach: Some(Box::new(detach)),
        }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Detach now instead of at drop
    pub fn detach(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("path", &self.path)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Continuous `value` listener
///
/// The stream yields the current value first and then the full node on
/// every change. The listener stays attached until the guard is dropped.
pub struct Subscription {
    guard: ListenerGuard,
    events: BoxStream<'static, Snapshot>,
}

impl Subscription {
    #[must_use]
    pub fn new(guard: ListenerGuard, events: BoxStream<'static, Snapshot>) -> Self {
        Self { guard, events }
    }

    pub fn path(&self) -> &StorePath {
        self.guard.path()
    }

    /// Separate the guard from the event stream so they can live in different owners
    pub fn split(self) -> (ListenerGuard, BoxStream<'static, Snapshot>) {
        (self.guard, self.events)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
