//! Session - the signed-in user and what hangs off it
//!
//! Populated at sign-in, cleared at sign-out, passed by reference to the
//! services that need the current identity.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::watch;

use messenger_core::{Profile, User, UserId};

use super::error::{ServiceError, ServiceResult};
use super::listener::ActiveListener;
use super::presence::PresenceTracker;

/// Explicit session context
pub struct Session {
    user: RwLock<Option<User>>,
    profile: Arc<watch::Sender<Option<Profile>>>,
    presence: Mutex<Option<PresenceTracker>>,
    profile_listener: Mutex<Option<ActiveListener>>,
}

impl Session {
    /// Create an empty, signed-out session
    #[must_use]
    pub fn new() -> Self {
        let (profile, _) = watch::channel(None);
        Self {
            user: RwLock::new(None),
            profile: Arc::new(profile),
            presence: Mutex::new(None),
            profile_listener: Mutex::new(None),
        }
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<User> {
        self.user.read().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.read().as_ref().map(|u| u.uid.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.read().is_some()
    }

    /// The signed-in user, or `NotSignedIn`
    pub fn require_user(&self) -> ServiceResult<User> {
        self.current_user().ok_or(ServiceError::NotSignedIn)
    }

    /// Latest own profile seen by the profile watch
    pub fn profile(&self) -> Option<Profile> {
        self.profile.borrow().clone()
    }

    /// Follow own-profile changes
    pub fn subscribe_profile(&self) -> watch::Receiver<Option<Profile>> {
        self.profile.subscribe()
    }

    /// Whether presence tracking is running for this session
    pub fn presence_active(&self) -> bool {
        self.presence
            .lock()
            .as_ref()
            .is_some_and(PresenceTracker::is_active)
    }

    // === Lifecycle (driven by AuthService) ===

    /// Install `user` unless someone is already signed in
    pub(crate) fn begin(&self, user: User) -> ServiceResult<()> {
        let mut current = self.user.write();
        if current.is_some() {
            return Err(ServiceError::validation("A user is already signed in"));
        }
        *current = Some(user);
        Ok(())
    }

    pub(crate) fn set_presence(&self, tracker: PresenceTracker) {
        *self.presence.lock() = Some(tracker);
    }

    pub(crate) fn set_profile_listener(&self, listener: ActiveListener) {
        *self.profile_listener.lock() = Some(listener);
    }

    pub(crate) fn profile_sender(&self) -> Arc<watch::Sender<Option<Profile>>> {
        Arc::clone(&self.profile)
    }

    /// Clear everything; the tracker is handed back so it can be stopped
    pub(crate) fn end(&self) -> Option<PresenceTracker> {
        self.profile_listener.lock().take();
        self.profile.send_replace(None);
        self.user.write().take();
        self.presence.lock().take()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &*self.user.read())
            .field("presence_active", &self.presence_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let session = Session::new();
        assert!(!session.is_signed_in());
        assert!(matches!(session.require_user(), Err(ServiceError::NotSignedIn)));

        let user = User::new(UserId::new("1").unwrap(), "a@example.com");
        session.begin(user.clone()).unwrap();
        assert!(matches!(
            session.begin(User::new(UserId::new("2").unwrap(), "b@example.com")),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(session.current_user(), Some(user));
        assert_eq!(session.user_id().unwrap().as_str(), "1");

        session
            .profile_sender()
            .send_replace(Some(Profile::new(UserId::new("1").unwrap())));
        assert!(session.profile().is_some());

        assert!(session.end().is_none());
        assert!(!session.is_signed_in());
        assert!(session.profile().is_none());
    }
}
