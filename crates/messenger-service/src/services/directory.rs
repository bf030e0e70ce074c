//! Directory list engine
//!
//! Follows the whole profile collection and publishes every other user
//! together with the last message exchanged with them.

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use messenger_core::value_objects::TYPING_KEY;
use messenger_core::{ConversationKey, Profile, Snapshot, UserId};

use crate::dto::DirectoryEntry;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::listener::ActiveListener;

/// Number of trailing children fetched per conversation; one may be `typing`
const LAST_MESSAGE_WINDOW: usize = 2;

/// Live directory of everyone except the local user
pub struct DirectoryList {
    ctx: ServiceContext,
    local: UserId,
    entries: Arc<watch::Sender<Vec<DirectoryEntry>>>,
    mounted: Mutex<Option<ActiveListener>>,
}

impl DirectoryList {
    pub fn new(ctx: ServiceContext, local: UserId) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self {
            ctx,
            local,
            entries: Arc::new(entries),
            mounted: Mutex::new(None),
        }
    }

    /// Attach the profile-collection listener, replacing any previous one
    #[instrument(skip(self), fields(local = %self.local))]
    pub async fn mount(&self) -> ServiceResult<()> {
        self.unmount();

        let ctx = self.ctx.clone();
        let local = self.local.clone();
        let entries = Arc::clone(&self.entries);
        let on_profiles = move |snapshot: Snapshot| {
            let ctx = ctx.clone();
            let local = local.clone();
            let entries = Arc::clone(&entries);
            async move {
                let built = build_entries(&ctx, &local, &snapshot).await;
                debug!(count = built.len(), "Directory refreshed");
                entries.send_replace(built);
            }
        };

        let listener =
            ActiveListener::attach(self.ctx.store(), self.ctx.layout().profiles(), on_profiles)
                .await?;
        *self.mounted.lock() = Some(listener);
        Ok(())
    }

    pub fn unmount(&self) {
        self.mounted.lock().take();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.lock().is_some()
    }

    /// Latest published entries
    pub fn entries(&self) -> Vec<DirectoryEntry> {
        self.entries.borrow().clone()
    }

    pub fn subscribe_entries(&self) -> watch::Receiver<Vec<DirectoryEntry>> {
        self.entries.subscribe()
    }
}

impl std::fmt::Debug for DirectoryList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryList")
            .field("local", &self.local)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

/// Build one entry per foreign profile; last-message fetches run concurrently
async fn build_entries(
    ctx: &ServiceContext,
    local: &UserId,
    profiles: &Snapshot,
) -> Vec<DirectoryEntry> {
    let others: Vec<Profile> = profiles
        .children()
        .into_iter()
        .filter_map(|child| {
            let key = child.key()?;
            match Profile::from_node(key, child.value()) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    debug!(key, error = %e, "Skipping malformed profile");
                    None
                }
            }
        })
        .filter(|profile| &profile.id != local)
        .collect();

    join_all(others.into_iter().map(|profile| async move {
        let conversation = ConversationKey::resolve(local, &profile.id);
        let last_message = last_message(ctx, &conversation).await;
        DirectoryEntry {
            profile,
            conversation,
            last_message,
        }
    }))
    .await
}

/// Text of the newest message in a conversation, or `""`
async fn last_message(ctx: &ServiceContext, conversation: &ConversationKey) -> String {
    let path = ctx.layout().conversation(conversation);
    let children = match ctx.store().last_children(&path, LAST_MESSAGE_WINDOW).await {
        Ok(children) => children,
        Err(e) => {
            warn!(conversation = %conversation, error = %e, "Last message unavailable");
            return String::new();
        }
    };

    children
        .iter()
        .rev()
        .find(|child| child.key() != Some(TYPING_KEY))
        .and_then(|child| child.child("text").as_str().map(String::from))
        .unwrap_or_default()
}
