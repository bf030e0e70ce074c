//! # messenger-demo
//!
//! Wires two clients to one in-memory backend and walks through the
//! messenger flows: sign-up, profiles, directory, chat, typing, presence
//! and sign-out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use messenger_common::{AppConfig, AppError, ErrorNotice};
use messenger_core::{MediaAsset, MediaKind, UserId};
use messenger_service::{
    AuthService, ChatStream, DirectoryList, ProfileService, SaveProfileRequest, ServiceContext,
    ServiceContextBuilder, Session, SignUpRequest,
};
use messenger_store::{
    MemoryAuthProvider, MemoryConnection, MemoryObjectStore, MemoryServer, ScriptedMediaSource,
};

const SETTLE: Duration = Duration::from_secs(2);

/// One device: its connection, its ports and its session
struct Device {
    name: &'static str,
    connection: MemoryConnection,
    media: Arc<ScriptedMediaSource>,
    ctx: ServiceContext,
    session: Session,
}

impl Device {
    fn new(
        name: &'static str,
        server: &MemoryServer,
        objects: Arc<MemoryObjectStore>,
        accounts: Arc<MemoryAuthProvider>,
        config: &AppConfig,
    ) -> anyhow::Result<Self> {
        let connection = server.connect();
        let media = Arc::new(ScriptedMediaSource::new());
        let ctx = ServiceContextBuilder::new()
            .store(Arc::new(connection.clone()))
            .object_store(objects)
            .auth_provider(accounts)
            .media_source(media.clone())
            .config(config.clone())
            .build()?;

        Ok(Self {
            name,
            connection,
            media,
            ctx,
            session: Session::new(),
        })
    }

    fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.ctx, &self.session)
    }

    fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(&self.ctx, &self.session)
    }

    fn uid(&self) -> anyhow::Result<UserId> {
        Ok(self.session.require_user()?.uid)
    }
}

/// Run the scripted conversation
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting messenger demo...");

    let server = MemoryServer::new();
    let objects = Arc::new(MemoryObjectStore::new(
        config.storage.public_url.clone(),
        config.storage.max_image_bytes(),
    ));
    let accounts = Arc::new(MemoryAuthProvider::new());

    let alice = Device::new("alice", &server, objects.clone(), accounts.clone(), &config)?;
    let bob = Device::new("bob", &server, objects, accounts, &config)?;

    // Accounts and profiles
    for (device, nom, pseudo) in [(&alice, "Alice Martin", "alice"), (&bob, "Bob Durand", "bob")] {
        device
            .auth()
            .sign_up(SignUpRequest::new(
                format!("{}@example.com", device.name),
                "secret1",
            ))
            .await
            .with_context(|| format!("{} could not sign up", device.name))?;
        device
            .profiles()
            .save_profile(SaveProfileRequest::new(nom, pseudo, "+33 1 23 45 67 89"))
            .await?;
    }

    // Avatar: first attempt without permission, then with a picked image
    if let Err(e) = alice.profiles().change_profile_image(MediaKind::Camera).await {
        let notice = ErrorNotice::from(AppError::from(e));
        warn!(code = %notice.code, presentation = ?notice.presentation, "{}", notice.message);
    }
    alice.media.grant(MediaKind::Library);
    alice
        .media
        .queue(MediaAsset::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png"));
    if let Some(url) = alice
        .profiles()
        .change_profile_image(MediaKind::Library)
        .await?
    {
        info!(device = alice.name, url = %url, "Avatar published");
    }

    // Bob's directory
    let directory = DirectoryList::new(bob.ctx.clone(), bob.uid()?);
    directory.mount().await?;
    for entry in directory.entries() {
        info!(
            device = bob.name,
            contact = entry.profile.display_name(),
            state = %entry.profile.connection_state,
            last_message = %entry.last_message,
            "Directory entry"
        );
    }

    // Both sides open the conversation
    let alice_chat = ChatStream::new(alice.ctx.clone(), alice.uid()?, bob.uid()?);
    let bob_chat = ChatStream::new(bob.ctx.clone(), bob.uid()?, alice.uid()?);
    alice_chat.mount().await?;
    bob_chat.mount().await?;
    info!(conversation = %alice_chat.key(), "Conversation opened");

    alice_chat.on_input_changed("Hi Bob").await;
    wait_until(bob_chat.subscribe_typing(), |typing| *typing).await?;
    info!(device = bob.name, "Alice is typing...");

    alice_chat.send_message("Hi Bob").await?;
    bob_chat.send_message("Hello Alice!").await?;
    // blank input is ignored
    bob_chat.send_message("   ").await?;

    wait_until(alice_chat.subscribe_items(), |items| {
        items.iter().filter(|item| !item.is_separator()).count() == 2
    })
    .await?;
    let offset = alice.ctx.display_offset();
    let alice_id = alice.uid()?;
    for item in alice_chat.items() {
        match (item.label(), item.as_message()) {
            (Some(label), _) => info!(device = alice.name, "--- {label} ---"),
            (None, Some(message)) => info!(
                device = alice.name,
                at = %message.time_label(offset),
                mine = message.is_mine(&alice_id),
                "{}",
                message.text
            ),
            (None, None) => {}
        }
    }

    // Bob's connection drops; the server flips him offline
    bob.connection.go_offline();
    let bob_id = bob.uid()?;
    let alice_directory = DirectoryList::new(alice.ctx.clone(), alice.uid()?);
    alice_directory.mount().await?;
    wait_until(alice_directory.subscribe_entries(), |entries| {
        entries
            .iter()
            .any(|e| e.profile.id == bob_id && !e.profile.is_online())
    })
    .await?;
    if let Some(entry) = alice_directory.entries().first() {
        info!(
            device = alice.name,
            last_message = %entry.last_message,
            "Bob went offline"
        );
    }

    bob.connection.go_online();

    // Tear down
    alice_chat.unmount();
    bob_chat.unmount();
    directory.unmount();
    alice_directory.unmount();
    alice.auth().sign_out().await?;
    bob.auth().sign_out().await?;

    info!(listeners = server.registry().len(), "Demo finished");
    Ok(())
}

async fn wait_until<T, F>(mut rx: watch::Receiver<T>, condition: F) -> anyhow::Result<()>
where
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(SETTLE, rx.wait_for(condition))
        .await
        .context("timed out waiting for an update")?
        .context("publisher went away")?;
    Ok(())
}
