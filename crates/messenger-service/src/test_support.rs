//! In-memory wiring shared by the service tests

use serde_json::Value;
use std::sync::Arc;

use messenger_common::AppConfig;
use messenger_core::{Profile, RealtimeStore, UserId};
use messenger_store::{
    MemoryAuthProvider, MemoryConnection, MemoryObjectStore, MemoryServer, ScriptedMediaSource,
};

use crate::services::{ServiceContext, ServiceContextBuilder};

/// One simulated client attached to a shared server
pub(crate) struct TestClient {
    pub server: MemoryServer,
    pub connection: MemoryConnection,
    pub ctx: ServiceContext,
    pub objects: Arc<MemoryObjectStore>,
    pub auth: Arc<MemoryAuthProvider>,
    pub media: Arc<ScriptedMediaSource>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_server(&MemoryServer::new())
    }

    pub fn with_server(server: &MemoryServer) -> Self {
        let config = AppConfig::default();
        let connection = server.connect();
        let objects = Arc::new(MemoryObjectStore::new(
            config.storage.public_url.clone(),
            config.storage.max_image_bytes(),
        ));
        let auth = Arc::new(MemoryAuthProvider::new());
        let media = Arc::new(ScriptedMediaSource::new());

        let ctx = ServiceContextBuilder::new()
            .store(Arc::new(connection.clone()))
            .object_store(objects.clone())
            .auth_provider(auth.clone())
            .media_source(media.clone())
            .config(config)
            .build()
            .unwrap();

        Self {
            server: server.clone(),
            connection,
            ctx,
            objects,
            auth,
            media,
        }
    }

    pub fn register(&self, uid: &str, email: &str, password: &str) {
        self.auth
            .register(UserId::new(uid).unwrap(), email, password)
            .unwrap();
    }

    /// Write a raw profile node for `id`
    pub async fn seed_profile(&self, id: &str, value: Value) {
        let path = self.ctx.layout().profile(&UserId::new(id).unwrap());
        self.connection.set(&path, value).await.unwrap();
    }

    pub fn profile_value(&self, id: &str) -> Value {
        self.server
            .value_at(&self.ctx.layout().profile(&UserId::new(id).unwrap()))
    }

    pub fn profile(&self, id: &str) -> Profile {
        let path = self.ctx.layout().profile(&UserId::new(id).unwrap());
        let key = path.key().unwrap().to_string();
        Profile::from_node(&key, &self.server.value_at(&path)).unwrap()
    }
}
