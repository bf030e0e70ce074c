//! Presence service
//!
//! Turns a client's live connectivity into durable `connectionState` and
//! `lastSeen` fields on its own profile. The server flips the profile to
//! offline through a disconnect hook, so a crashed client still ends up
//! offline.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use messenger_core::entities::{FIELD_CONNECTION_STATE, FIELD_LAST_SEEN};
use messenger_core::{
    server_timestamp, ConnectionState, RealtimeStore, Snapshot, StorePath, UserId,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::listener::ActiveListener;

/// Presence service
pub struct PresenceService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PresenceService<'a> {
    /// Create a new PresenceService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Start tracking connectivity for `user_id`
    ///
    /// Never fails: when the connectivity signal cannot be observed the
    /// tracker stays inactive and the application keeps working.
    #[instrument(skip(self))]
    pub async fn start_tracking(&self, user_id: &UserId) -> PresenceTracker {
        let profile_path = self.ctx.layout().profile(user_id);
        let store = self.ctx.store_handle();

        let on_signal = {
            let store = Arc::clone(&store);
            let profile_path = profile_path.clone();
            move |snapshot: Snapshot| {
                let store = Arc::clone(&store);
                let profile_path = profile_path.clone();
                async move {
                    if snapshot.as_bool() == Some(true) {
                        announce_online(store.as_ref(), &profile_path).await;
                    }
                }
            }
        };

        let listener =
            match ActiveListener::attach(store.as_ref(), &StorePath::connected(), on_signal).await {
                Ok(listener) => Some(listener),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Presence tracking unavailable");
                    None
                }
            };

        PresenceTracker {
            user_id: user_id.clone(),
            profile_path,
            store,
            listener,
        }
    }

    /// Write `state` and a fresh `lastSeen` to the user's profile
    ///
    /// Used on explicit sign-in and sign-out; no disconnect hook involved.
    #[instrument(skip(self))]
    pub async fn modify_connection_status(
        &self,
        user_id: &UserId,
        state: ConnectionState,
    ) -> ServiceResult<()> {
        let path = self.ctx.layout().profile(user_id);
        self.ctx
            .store()
            .update(&path, status_fields(state))
            .await
            .map_err(|e| ServiceError::write_failure("update connection status", e))?;

        debug!(user_id = %user_id, state = %state, "Connection status written");
        Ok(())
    }
}

/// Fields written for a connection state change
pub fn status_fields(state: ConnectionState) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(FIELD_CONNECTION_STATE.to_string(), Value::from(state.as_str()));
    fields.insert(FIELD_LAST_SEEN.to_string(), server_timestamp());
    fields
}

/// Register the offline hook, then mark the profile online
async fn announce_online(store: &dyn RealtimeStore, profile_path: &StorePath) {
    if let Err(e) = store
        .on_disconnect_update(profile_path, status_fields(ConnectionState::Offline))
        .await
    {
        warn!(path = %profile_path, error = %e, "Could not register disconnect hook");
        return;
    }

    match store
        .update(profile_path, status_fields(ConnectionState::Online))
        .await
    {
        Ok(()) => debug!(path = %profile_path, "Marked online"),
        Err(e) => warn!(path = %profile_path, error = %e, "Could not mark online"),
    }
}

/// Live connectivity tracking for one signed-in user
pub struct PresenceTracker {
    user_id: UserId,
    profile_path: StorePath,
    store: Arc<dyn RealtimeStore>,
    listener: Option<ActiveListener>,
}

impl PresenceTracker {
    /// Whether the connectivity listener is attached
    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Detach the connectivity listener and cancel the pending offline hook
    #[instrument(skip(self), fields(user_id = %self.user_id))]
    pub async fn stop(mut self) -> ServiceResult<()> {
        let was_active = self.listener.take().is_some();
        if was_active {
            self.store
                .cancel_on_disconnect(&self.profile_path)
                .await
                .map_err(|e| ServiceError::write_failure("cancel disconnect hook", e))?;
        }
        debug!(was_active, "Presence tracking stopped");
        Ok(())
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("user_id", &self.user_id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestClient;
    use messenger_core::Profile;

    #[tokio::test]
    async fn test_start_marks_online_and_registers_hook() {
        let client = TestClient::new();
        let uid = UserId::new("1").unwrap();

        let tracker = PresenceService::new(&client.ctx).start_tracking(&uid).await;
        assert!(tracker.is_active());
        assert_eq!(client.connection.pending_hooks(), 1);

        let profile = client.profile("1");
        assert!(profile.is_online());
        assert!(profile.last_seen.is_some());
    }

    #[tokio::test]
    async fn test_disconnect_flips_offline() {
        let client = TestClient::new();
        let uid = UserId::new("1").unwrap();
        let _tracker = PresenceService::new(&client.ctx).start_tracking(&uid).await;

        client.connection.go_offline();
        let profile: Profile = client.profile("1");
        assert!(!profile.is_online());
    }

    #[tokio::test]
    async fn test_subscribe_failure_leaves_tracker_inactive() {
        let client = TestClient::new();
        client.server.deny_reads(StorePath::connected());
        let uid = UserId::new("1").unwrap();

        let tracker = PresenceService::new(&client.ctx).start_tracking(&uid).await;
        assert!(!tracker.is_active());
        assert_eq!(client.connection.pending_hooks(), 0);
        assert!(tracker.stop().await.is_ok());
    }

    #[tokio::test]
    async fn test_stop_cancels_hook() {
        let client = TestClient::new();
        let uid = UserId::new("1").unwrap();
        let tracker = PresenceService::new(&client.ctx).start_tracking(&uid).await;

        tracker.stop().await.unwrap();
        assert_eq!(client.connection.pending_hooks(), 0);
        assert_eq!(client.server.listener_count(&StorePath::connected()), 0);
    }

    #[tokio::test]
    async fn test_modify_connection_status() {
        let client = TestClient::new();
        let uid = UserId::new("1").unwrap();
        let presence = PresenceService::new(&client.ctx);

        presence
            .modify_connection_status(&uid, ConnectionState::Offline)
            .await
            .unwrap();
        assert!(!client.profile("1").is_online());

        client.server.deny_writes(client.ctx.layout().profiles().clone());
        let err = presence
            .modify_connection_status(&uid, ConnectionState::Online)
            .await
            .unwrap_err();
        assert!(err.is_write_failure());
    }
}
