//! Authentication service
//!
//! Handles sign-up, sign-in and sign-out, and wires presence tracking and
//! the own-profile watch into the session.

use tracing::{info, instrument, warn};
use validator::Validate;

use messenger_core::{ConnectionState, DomainError, User};

use crate::dto::{SignInRequest, SignUpRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::presence::PresenceService;
use super::profile::ProfileService;
use super::session::Session;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
    session: &'a Session,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext, session: &'a Session) -> Self {
        Self { ctx, session }
    }

    /// Create an account and sign it in
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> ServiceResult<User> {
        self.ensure_signed_out()?;
        request.validate()?;

        let user = self
            .ctx
            .auth_provider()
            .sign_up(request.email.trim(), &request.password)
            .await
            .map_err(provider_error)?;

        info!(user_id = %user.uid, "User registered successfully");
        self.start_session(user.clone()).await?;
        Ok(user)
    }

    /// Sign in with email and password
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_in(&self, request: SignInRequest) -> ServiceResult<User> {
        self.ensure_signed_out()?;
        request.validate()?;

        let user = self
            .ctx
            .auth_provider()
            .sign_in(request.email.trim(), &request.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in failed");
                provider_error(e)
            })?;

        info!(user_id = %user.uid, "User signed in successfully");
        self.start_session(user.clone()).await?;
        Ok(user)
    }

    /// Mark the user offline, sign out of the provider, then clear the session
    ///
    /// When the provider refuses, the session and presence tracking stay
    /// as they were and the profile is marked online again.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> ServiceResult<()> {
        let user = self.session.require_user()?;
        let presence = PresenceService::new(self.ctx);

        if let Err(e) = presence
            .modify_connection_status(&user.uid, ConnectionState::Offline)
            .await
        {
            warn!(user_id = %user.uid, error = %e, "Could not mark offline");
        }

        if let Err(e) = self.ctx.auth_provider().sign_out(&user).await {
            warn!(user_id = %user.uid, error = %e, "Sign-out failed");
            if let Err(e) = presence
                .modify_connection_status(&user.uid, ConnectionState::Online)
                .await
            {
                warn!(user_id = %user.uid, error = %e, "Could not restore online status");
            }
            return Err(ServiceError::from(e));
        }

        if let Some(tracker) = self.session.end() {
            if let Err(e) = tracker.stop().await {
                warn!(user_id = %user.uid, error = %e, "Could not stop presence tracking");
            }
        }

        info!(user_id = %user.uid, "User signed out");
        Ok(())
    }

    fn ensure_signed_out(&self) -> ServiceResult<()> {
        if self.session.is_signed_in() {
            return Err(ServiceError::validation("A user is already signed in"));
        }
        Ok(())
    }

    /// Populate the session and start everything that follows the user
    ///
    /// Losing a race against another user's sign-in on the same session
    /// hands the provider session back.
    async fn start_session(&self, user: User) -> ServiceResult<()> {
        let uid = user.uid.clone();
        if let Err(e) = self.session.begin(user.clone()) {
            if self.session.user_id().as_ref() != Some(&uid) {
                if let Err(e) = self.ctx.auth_provider().sign_out(&user).await {
                    warn!(user_id = %uid, error = %e, "Could not release provider session");
                }
            }
            return Err(e);
        }

        let presence = PresenceService::new(self.ctx);
        let tracker = presence.start_tracking(&uid).await;
        self.session.set_presence(tracker);

        if let Err(e) = presence
            .modify_connection_status(&uid, ConnectionState::Online)
            .await
        {
            warn!(user_id = %uid, error = %e, "Could not mark online");
        }

        if let Err(e) = ProfileService::new(self.ctx, self.session)
            .watch_own_profile()
            .await
        {
            warn!(user_id = %uid, error = %e, "Own profile unavailable");
        }
        Ok(())
    }
}

fn provider_error(err: DomainError) -> ServiceError {
    if err.is_auth() {
        ServiceError::auth_failure(err)
    } else {
        ServiceError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestClient;
    use messenger_core::{StorePath, UserId};

    #[tokio::test]
    async fn test_sign_in_starts_presence() {
        let client = TestClient::new();
        client.register("1", "a@example.com", "secret1");
        let session = Session::new();

        let user = AuthService::new(&client.ctx, &session)
            .sign_in(SignInRequest::new("a@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(user.uid, UserId::new("1").unwrap());
        assert!(session.is_signed_in());
        assert!(session.presence_active());
        assert!(client.profile("1").is_online());
        assert!(session.profile().is_some());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_empty_fields() {
        let client = TestClient::new();
        let session = Session::new();

        let err = AuthService::new(&client.ctx, &session)
            .sign_in(SignInRequest::new("", ""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please fill in both email and password");
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_bad_credentials_are_auth_failures() {
        let client = TestClient::new();
        client.register("1", "a@example.com", "secret1");
        let session = Session::new();

        let err = AuthService::new(&client.ctx, &session)
            .sign_in(SignInRequest::new("a@example.com", "wrong!!"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AuthFailure(_)));
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_out() {
        let client = TestClient::new();
        let session = Session::new();
        let auth = AuthService::new(&client.ctx, &session);

        let user = auth
            .sign_up(SignUpRequest::new("new@example.com", "secret1"))
            .await
            .unwrap();
        assert!(client.profile(user.uid.as_str()).is_online());

        auth.sign_out().await.unwrap();
        assert!(!session.is_signed_in());
        assert!(!client.profile(user.uid.as_str()).is_online());
        assert_eq!(client.connection.pending_hooks(), 0);
        assert_eq!(client.server.listener_count(&StorePath::connected()), 0);
        assert!(matches!(auth.sign_out().await, Err(ServiceError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session() {
        let client = TestClient::new();
        client.register("1", "a@example.com", "secret1");
        let session = Session::new();
        let auth = AuthService::new(&client.ctx, &session);
        auth.sign_in(SignInRequest::new("a@example.com", "secret1"))
            .await
            .unwrap();

        client.auth.set_failing(true);
        assert!(auth.sign_out().await.is_err());

        let uid = UserId::new("1").unwrap();
        assert!(session.is_signed_in());
        assert!(session.presence_active());
        assert!(session.profile().is_some());
        assert!(client.auth.is_signed_in(&uid));
        assert_eq!(client.connection.pending_hooks(), 1);
        assert!(client.profile("1").is_online());

        client.auth.set_failing(false);
        auth.sign_out().await.unwrap();
        assert!(!session.is_signed_in());
        assert!(!client.auth.is_signed_in(&uid));
        assert_eq!(client.connection.pending_hooks(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sign_ins_keep_one_session() {
        let client = TestClient::new();
        client.register("1", "a@example.com", "secret1");
        client.register("2", "b@example.com", "secret2");
        let session = Session::new();
        let auth = AuthService::new(&client.ctx, &session);

        let (first, second) = tokio::join!(
            auth.sign_in(SignInRequest::new("a@example.com", "secret1")),
            auth.sign_in(SignInRequest::new("b@example.com", "secret2")),
        );

        assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
        let winner = session.user_id().unwrap();
        let loser = if winner.as_str() == "1" { "2" } else { "1" };
        assert!(client.auth.is_signed_in(&winner));
        assert!(!client.auth.is_signed_in(&UserId::new(loser).unwrap()));
        assert_eq!(client.connection.pending_hooks(), 1);
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let client = TestClient::new();
        let session = Session::new();

        let err = AuthService::new(&client.ctx, &session)
            .sign_up(SignUpRequest::new("new@example.com", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
