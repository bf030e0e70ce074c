//! Ports and the values that cross them

mod ports;
mod snapshot;

pub use ports::{
    AuthProvider, MediaAsset, MediaKind, MediaSource, ObjectStore, PortResult, RealtimeStore,
};
pub use snapshot::{
    is_server_timestamp, server_timestamp, ListenerGuard, Snapshot, Subscription,
    SERVER_VALUE_KEY,
};
