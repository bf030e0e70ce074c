//! Test helpers for integration tests
//!
//! Provides a shared in-memory backend, per-device wiring and utilities for
//! waiting on live updates.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::sync::watch;

use messenger_common::{AppConfig, TracingConfig};
use messenger_core::{Profile, RealtimeStore, StorePath, UserId};
use messenger_service::{
    AuthService, ProfileService, ServiceContext, ServiceContextBuilder, Session, SignInRequest,
};
use messenger_store::{
    MemoryAuthProvider, MemoryConnection, MemoryObjectStore, MemoryServer, ScriptedMediaSource,
};

/// How long a scenario waits for a live update
pub const SETTLE: Duration = Duration::from_secs(2);

/// Backend shared by every device in a scenario
pub struct TestBackend {
    pub server: MemoryServer,
    pub objects: Arc<MemoryObjectStore>,
    pub accounts: Arc<MemoryAuthProvider>,
    pub config: AppConfig,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let _ = messenger_common::try_init_tracing_with_config(TracingConfig::test());
        Self {
            server: MemoryServer::new(),
            objects: Arc::new(MemoryObjectStore::new(
                config.storage.public_url.clone(),
                config.storage.max_image_bytes(),
            )),
            accounts: Arc::new(MemoryAuthProvider::new()),
            config,
        }
    }

    /// Create an account with a fixed uid
    pub fn register(&self, uid: &str, email: &str, password: &str) -> Result<()> {
        self.accounts
            .register(UserId::new(uid)?, email, password)
            .map_err(|e| anyhow::anyhow!("register {uid}: {e}"))?;
        Ok(())
    }

    /// Attach a new device with its own connection
    pub fn device(&self) -> Result<TestDevice> {
        let connection = self.server.connect();
        let media = Arc::new(ScriptedMediaSource::new());
        let ctx = ServiceContextBuilder::new()
            .store(Arc::new(connection.clone()))
            .object_store(self.objects.clone())
            .auth_provider(self.accounts.clone())
            .media_source(media.clone())
            .config(self.config.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("context: {e}"))?;

        Ok(TestDevice {
            connection,
            media,
            ctx,
            session: Session::new(),
        })
    }

    /// Register `uid` and return a device signed in as that user
    pub async fn signed_in_device(&self, uid: &str) -> Result<TestDevice> {
        let email = format!("{uid}@example.com");
        self.register(uid, &email, crate::TEST_PASSWORD)?;
        let device = self.device()?;
        device
            .auth()
            .sign_in(SignInRequest::new(email, crate::TEST_PASSWORD))
            .await
            .map_err(|e| anyhow::anyhow!("sign in {uid}: {e}"))?;
        Ok(device)
    }

    pub fn profile_path(&self, uid: &str) -> Result<StorePath> {
        Ok(self.config.store.layout()?.profile(&UserId::new(uid)?))
    }

    /// Decoded profile as currently stored
    pub fn profile(&self, uid: &str) -> Result<Profile> {
        let path = self.profile_path(uid)?;
        let key = path.key().context("profile path has no key")?.to_string();
        Ok(Profile::from_node(&key, &self.server.value_at(&path))?)
    }

    pub fn value_at(&self, path: &StorePath) -> Value {
        self.server.value_at(path)
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// One simulated device
pub struct TestDevice {
    pub connection: MemoryConnection,
    pub media: Arc<ScriptedMediaSource>,
    pub ctx: ServiceContext,
    pub session: Session,
}

impl TestDevice {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.ctx, &self.session)
    }

    pub fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(&self.ctx, &self.session)
    }

    pub fn uid(&self) -> Result<UserId> {
        self.session.user_id().context("device is not signed in")
    }

    /// Write a raw node through this device's connection
    pub async fn seed(&self, path: &StorePath, value: Value) -> Result<()> {
        self.connection
            .set(path, value)
            .await
            .map_err(|e| anyhow::anyhow!("seed {path}: {e}"))
    }
}

/// Wait until `condition` holds for the published value and return a copy
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, condition: F) -> Result<T>
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    let value = tokio::time::timeout(SETTLE, rx.wait_for(condition))
        .await
        .context("timed out waiting for an update")?
        .context("publisher dropped")?
        .clone();
    Ok(value)
}
