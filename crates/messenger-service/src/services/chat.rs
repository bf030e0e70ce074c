//! Chat stream engine
//!
//! Follows one conversation: the full message list and the shared typing
//! flag. Every full-list delivery is re-projected into display items, so
//! the projection never depends on what was seen before.

use chrono::{FixedOffset, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use messenger_core::value_objects::TYPING_KEY;
use messenger_core::{
    typing_active, with_date_separators, ConversationKey, DisplayItem, Message, Snapshot,
    StorePath, UserId,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::listener::ActiveListener;

struct Mounted {
    _messages: ActiveListener,
    _typing: ActiveListener,
}

/// Live view of a conversation between the local user and one peer
pub struct ChatStream {
    ctx: ServiceContext,
    local: UserId,
    peer: UserId,
    key: ConversationKey,
    conversation: StorePath,
    typing_path: StorePath,
    input: Mutex<String>,
    items: Arc<watch::Sender<Vec<DisplayItem>>>,
    typing: Arc<watch::Sender<bool>>,
    mounted: Mutex<Option<Mounted>>,
}

impl ChatStream {
    /// Create an idle stream; nothing is attached until [`ChatStream::mount`]
    pub fn new(ctx: ServiceContext, local: UserId, peer: UserId) -> Self {
        let key = ConversationKey::resolve(&local, &peer);
        let conversation = ctx.layout().conversation(&key);
        let typing_path = ctx.layout().typing(&key);
        let (items, _) = watch::channel(Vec::new());
        let (typing, _) = watch::channel(false);

        Self {
            ctx,
            local,
            peer,
            key,
            conversation,
            typing_path,
            input: Mutex::new(String::new()),
            items: Arc::new(items),
            typing: Arc::new(typing),
            mounted: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    pub fn peer(&self) -> &UserId {
        &self.peer
    }

    /// Attach the message and typing listeners
    ///
    /// Mounting an already mounted stream detaches the old listeners first.
    #[instrument(skip(self), fields(conversation = %self.key))]
    pub async fn mount(&self) -> ServiceResult<()> {
        self.unmount();

        let offset = self.ctx.display_offset();
        let items = Arc::clone(&self.items);
        let on_messages = move |snapshot: Snapshot| {
            let items = Arc::clone(&items);
            async move {
                items.send_replace(project_display(&snapshot, offset));
            }
        };
        let messages =
            ActiveListener::attach(self.ctx.store(), &self.conversation, on_messages).await?;

        let typing = Arc::clone(&self.typing);
        let local = self.local.clone();
        let on_typing = move |snapshot: Snapshot| {
            let typing = Arc::clone(&typing);
            let active = typing_active(snapshot.value(), &local);
            async move {
                typing.send_replace(active);
            }
        };
        let typing =
            ActiveListener::attach(self.ctx.store(), &self.typing_path, on_typing).await?;

        *self.mounted.lock() = Some(Mounted {
            _messages: messages,
            _typing: typing,
        });
        debug!("Chat stream mounted");
        Ok(())
    }

    /// Detach both listeners
    pub fn unmount(&self) {
        if self.mounted.lock().take().is_some() {
            debug!(conversation = %self.key, "Chat stream unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.lock().is_some()
    }

    /// Current display items in push-key order
    pub fn items(&self) -> Vec<DisplayItem> {
        self.items.borrow().clone()
    }

    pub fn subscribe_items(&self) -> watch::Receiver<Vec<DisplayItem>> {
        self.items.subscribe()
    }

    /// Whether the peer is typing
    pub fn typing_active(&self) -> bool {
        *self.typing.borrow()
    }

    pub fn subscribe_typing(&self) -> watch::Receiver<bool> {
        self.typing.subscribe()
    }

    /// Current input buffer
    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    /// Record the input buffer and publish the typing flag
    ///
    /// Every change is written; write failures are only logged.
    pub async fn on_input_changed(&self, text: &str) {
        *self.input.lock() = text.to_string();

        let value = if text.is_empty() {
            Value::Null
        } else {
            Value::from(self.local.as_str())
        };
        if let Err(e) = self.ctx.store().set(&self.typing_path, value).await {
            debug!(conversation = %self.key, error = %e, "Typing flag not written");
        }
    }

    /// Send `text` to the peer
    ///
    /// Blank text is ignored and returns `None`. On failure nothing local
    /// changes and the stream stays mounted.
    #[instrument(skip(self, text), fields(conversation = %self.key))]
    pub async fn send_message(&self, text: &str) -> ServiceResult<Option<Message>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let message = Message::new(self.local.clone(), self.peer.clone(), text, Utc::now());
        let value = serde_json::to_value(&message)
            .map_err(|e| ServiceError::internal(e.to_string()))?;
        let path = self
            .conversation
            .child(self.ctx.store().push_key().as_str());

        self.ctx
            .store()
            .set(&path, value)
            .await
            .map_err(|e| ServiceError::write_failure("send message", e))?;

        if let Err(e) = self.ctx.store().set(&self.typing_path, Value::Null).await {
            debug!(error = %e, "Typing flag not cleared");
        }
        self.input.lock().clear();

        info!(message_id = %message.id, "Message sent");
        Ok(Some(message))
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("key", &self.key)
            .field("local", &self.local)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

/// Messages of a conversation node in push-key order
///
/// Keys are assigned by the store at write time, so this order does not
/// depend on the sender's clock. The typing child and malformed entries
/// are skipped.
pub fn project_messages(conversation: &Snapshot) -> Vec<Message> {
    conversation
        .children()
        .into_iter()
        .filter(|child| child.key() != Some(TYPING_KEY))
        .filter_map(|child| match child.deserialize::<Message>() {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "Skipping malformed message");
                None
            }
        })
        .collect()
}

/// Display items for a conversation node in the given offset
pub fn project_display(conversation: &Snapshot, offset: FixedOffset) -> Vec<DisplayItem> {
    with_date_separators(&project_messages(conversation), offset)
}
