//! Service context - dependency container for services
//!
//! Holds the ports, the store layout and the configuration needed by
//! services. Cloning is cheap; long-lived engines keep their own clone.

use chrono::FixedOffset;
use std::sync::Arc;

use messenger_common::AppConfig;
use messenger_core::{AuthProvider, MediaSource, ObjectStore, RealtimeStore, StoreLayout};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - The realtime store connection of this client
/// - Object storage for profile images
/// - The auth provider
/// - The device media source
#[derive(Clone)]
pub struct ServiceContext {
    // Ports
    store: Arc<dyn RealtimeStore>,
    object_store: Arc<dyn ObjectStore>,
    auth_provider: Arc<dyn AuthProvider>,
    media_source: Arc<dyn MediaSource>,

    // Settings
    layout: StoreLayout,
    config: Arc<AppConfig>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    ///
    /// # Errors
    /// Returns an error if the configured store roots are invalid
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        object_store: Arc<dyn ObjectStore>,
        auth_provider: Arc<dyn AuthProvider>,
        media_source: Arc<dyn MediaSource>,
        config: AppConfig,
    ) -> ServiceResult<Self> {
        let layout = config.store.layout()?;

        Ok(Self {
            store,
            object_store,
            auth_provider,
            media_source,
            layout,
            config: Arc::new(config),
        })
    }

    // === Ports ===

    /// Get the realtime store
    pub fn store(&self) -> &dyn RealtimeStore {
        self.store.as_ref()
    }

    /// Get an owned handle to the realtime store for background tasks
    pub fn store_handle(&self) -> Arc<dyn RealtimeStore> {
        Arc::clone(&self.store)
    }

    /// Get the object store
    pub fn object_store(&self) -> &dyn ObjectStore {
        self.object_store.as_ref()
    }

    /// Get the auth provider
    pub fn auth_provider(&self) -> &dyn AuthProvider {
        self.auth_provider.as_ref()
    }

    /// Get the media source
    pub fn media_source(&self) -> &dyn MediaSource {
        self.media_source.as_ref()
    }

    // === Settings ===

    /// Where collections live in the tree
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Offset used for calendar dates
    pub fn display_offset(&self) -> FixedOffset {
        self.config.display.offset()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("ports", &"...")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    store: Option<Arc<dyn RealtimeStore>>,
    object_store: Option<Arc<dyn ObjectStore>>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    media_source: Option<Arc<dyn MediaSource>>,
    config: Option<AppConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn RealtimeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn object_store(mut self, object_store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(object_store);
        self
    }

    pub fn auth_provider(mut self, auth_provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(auth_provider);
        self
    }

    pub fn media_source(mut self, media_source: Arc<dyn MediaSource>) -> Self {
        self.media_source = Some(media_source);
        self
    }

    /// Defaults to `AppConfig::default()` when not set
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        ServiceContext::new(
            self.store
                .ok_or_else(|| ServiceError::validation("store is required"))?,
            self.object_store
                .ok_or_else(|| ServiceError::validation("object_store is required"))?,
            self.auth_provider
                .ok_or_else(|| ServiceError::validation("auth_provider is required"))?,
            self.media_source
                .ok_or_else(|| ServiceError::validation("media_source is required"))?,
            self.config.unwrap_or_default(),
        )
    }
}
