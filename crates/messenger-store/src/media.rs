//! Scripted media source
//!
//! Stands in for the device image picker and camera: permissions are
//! granted or refused per kind and picks are queued ahead of time.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;

use messenger_core::{MediaAsset, MediaKind, MediaSource, PortResult};

/// Media source answering from a script
#[derive(Debug, Default)]
pub struct ScriptedMediaSource {
    permissions: DashMap<MediaKind, bool>,
    picks: Mutex<VecDeque<Option<MediaAsset>>>,
}

impl ScriptedMediaSource {
    /// Every permission is refused until granted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, kind: MediaKind) {
        self.permissions.insert(kind, true);
    }

    pub fn refuse(&self, kind: MediaKind) {
        self.permissions.insert(kind, false);
    }

    /// Queue an image for the next pick
    pub fn queue(&self, asset: MediaAsset) {
        self.picks.lock().push_back(Some(asset));
    }

    /// Queue a cancelled pick
    pub fn queue_cancel(&self) {
        self.picks.lock().push_back(None);
    }
}

#[async_trait]
impl MediaSource for ScriptedMediaSource {
    async fn request_permission(&self, kind: MediaKind) -> bool {
        self.permissions.get(&kind).is_some_and(|granted| *granted)
    }

    /// An empty queue behaves like a cancelled pick
    async fn acquire(&self, _kind: MediaKind) -> PortResult<Option<MediaAsset>> {
        Ok(self.picks.lock().pop_front().flatten())
    }
}
