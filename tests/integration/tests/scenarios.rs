//! End-to-end messenger scenarios
//!
//! Every scenario runs against one in-memory backend shared by several
//! simulated devices; no external services are required.
//!
//! Run with: cargo test -p integration-tests --test scenarios

use integration_tests::{fixtures::*, wait_for, TestBackend};
use messenger_core::{ConnectionState, ConversationKey, MediaAsset, MediaKind, StorePath, UserId};
use messenger_service::{ChatStream, DirectoryList, ServiceError};

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

// ============================================================================
// Conversation Tests
// ============================================================================

#[tokio::test]
async fn test_conversation_key_regardless_of_opener() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let two = backend.signed_in_device("2").await.unwrap();

    let opened_by_two = ChatStream::new(two.ctx.clone(), uid("2"), uid("1"));
    let opened_by_one = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));

    assert_eq!(opened_by_two.key().as_str(), "21");
    assert_eq!(opened_by_one.key(), opened_by_two.key());
}

#[tokio::test]
async fn test_messages_reach_both_sides() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let two = backend.signed_in_device("2").await.unwrap();

    let chat_one = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));
    let chat_two = ChatStream::new(two.ctx.clone(), uid("2"), uid("1"));
    chat_one.mount().await.unwrap();
    chat_two.mount().await.unwrap();

    chat_one.send_message("salut").await.unwrap();
    chat_two.send_message("ça va ?").await.unwrap();

    let mut rx = chat_one.subscribe_items();
    let items = wait_for(&mut rx, |items| {
        items.iter().filter(|i| !i.is_separator()).count() == 2
    })
    .await
    .unwrap();

    // both messages were sent today, so a single separator opens the list
    assert!(items[0].is_separator());
    assert_eq!(items.iter().filter(|i| i.is_separator()).count(), 1);
    let texts: Vec<_> = items
        .iter()
        .filter_map(|i| i.as_message())
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(texts, ["salut", "ça va ?"]);

    let mut rx = chat_two.subscribe_items();
    let theirs = wait_for(&mut rx, |items| items.len() == 3).await.unwrap();
    assert_eq!(theirs, items);

    for item in &items {
        if let Some(message) = item.as_message() {
            assert_eq!(message.conversation_key(), *chat_one.key());
        }
    }
}

#[tokio::test]
async fn test_blank_send_writes_nothing() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let chat = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));
    chat.mount().await.unwrap();

    chat.on_input_changed("   ").await;
    assert!(chat.send_message("").await.unwrap().is_none());
    assert!(chat.send_message("   ").await.unwrap().is_none());
    assert_eq!(chat.input(), "   ");

    let conversation = one.ctx.layout().conversation(chat.key());
    let node = backend.value_at(&conversation);
    let stored: Vec<_> = node
        .as_object()
        .map(|o| o.keys().filter(|k| *k != "typing").cloned().collect())
        .unwrap_or_default();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_typing_never_shows_for_self() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let two = backend.signed_in_device("2").await.unwrap();
    let chat_one = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));
    let chat_two = ChatStream::new(two.ctx.clone(), uid("2"), uid("1"));
    chat_one.mount().await.unwrap();
    chat_two.mount().await.unwrap();

    chat_one.on_input_changed("b").await;
    let mut peer_rx = chat_two.subscribe_typing();
    wait_for(&mut peer_rx, |t| *t).await.unwrap();
    assert!(!chat_one.typing_active());

    // sending clears the flag for the peer too
    chat_one.send_message("bonjour").await.unwrap();
    wait_for(&mut peer_rx, |t| !*t).await.unwrap();
    assert!(chat_one.input().is_empty());
}

#[tokio::test]
async fn test_send_failure_leaves_state_intact() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let chat = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));
    chat.mount().await.unwrap();
    chat.send_message("first").await.unwrap();

    let mut rx = chat.subscribe_items();
    let before = wait_for(&mut rx, |items| items.len() == 2).await.unwrap();

    chat.on_input_changed("second").await;
    backend
        .server
        .deny_writes(one.ctx.layout().conversation(chat.key()));
    let err = chat.send_message("second").await.unwrap_err();

    assert!(matches!(err, ServiceError::WriteFailure { .. }));
    assert_eq!(err.to_string().split(':').next(), Some("Could not send message"));
    assert!(chat.is_mounted());
    assert_eq!(chat.input(), "second");
    assert_eq!(chat.items(), before);

    // the stream keeps working once writes are allowed again
    backend.server.clear_rules();
    chat.send_message("second").await.unwrap();
    wait_for(&mut rx, |items| items.len() == 3).await.unwrap();
}

#[tokio::test]
async fn test_remount_keeps_one_listener_per_path() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let chat = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));
    let directory = DirectoryList::new(one.ctx.clone(), uid("1"));
    let conversation = one.ctx.layout().conversation(chat.key());
    let typing = one.ctx.layout().typing(chat.key());
    let profiles = one.ctx.layout().profiles().clone();

    for _ in 0..3 {
        chat.mount().await.unwrap();
        directory.mount().await.unwrap();
        chat.unmount();
        directory.unmount();
        chat.mount().await.unwrap();
        directory.mount().await.unwrap();
    }

    assert_eq!(backend.server.listener_count(&conversation), 1);
    assert_eq!(backend.server.listener_count(&typing), 1);
    assert_eq!(backend.server.listener_count(&profiles), 1);
}

// ============================================================================
// Directory Tests
// ============================================================================

#[tokio::test]
async fn test_directory_of_three_excludes_self() {
    let backend = TestBackend::new();
    let one = backend.device().unwrap();
    for id in ["1", "2", "3"] {
        one.seed(&backend.profile_path(id).unwrap(), profile_node(id))
            .await
            .unwrap();
    }

    let directory = DirectoryList::new(one.ctx.clone(), uid("1"));
    directory.mount().await.unwrap();

    let entries = directory.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.last_message.is_empty()));
    let ids: Vec<_> = entries.iter().map(|e| e.profile.id.as_str()).collect();
    assert_eq!(ids, ["2", "3"]);
}

#[tokio::test]
async fn test_directory_shows_last_message_and_presence() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let two = backend.signed_in_device("2").await.unwrap();

    let chat = ChatStream::new(two.ctx.clone(), uid("2"), uid("1"));
    chat.send_message("t'es là ?").await.unwrap();
    chat.on_input_changed("j'écris").await;

    let directory = DirectoryList::new(one.ctx.clone(), uid("1"));
    directory.mount().await.unwrap();
    let entries = directory.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].conversation, ConversationKey::resolve(&uid("1"), &uid("2")));
    assert_eq!(entries[0].last_message, "t'es là ?");
    assert!(entries[0].profile.is_online());

    two.connection.go_offline();
    let mut rx = directory.subscribe_entries();
    let entries = wait_for(&mut rx, |entries| {
        entries.first().is_some_and(|e| !e.profile.is_online())
    })
    .await
    .unwrap();
    assert_eq!(entries[0].last_message, "t'es là ?");
}

// ============================================================================
// Presence Tests
// ============================================================================

#[tokio::test]
async fn test_presence_follows_connectivity() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();

    let profile = backend.profile("1").unwrap();
    assert_eq!(profile.connection_state, ConnectionState::Online);
    let first_seen = profile.last_seen.unwrap();
    assert!(one.session.presence_active());
    assert_eq!(one.connection.pending_hooks(), 1);

    // the server applies the disconnect hook on its own
    one.connection.go_offline();
    let profile = backend.profile("1").unwrap();
    assert_eq!(profile.connection_state, ConnectionState::Offline);
    assert!(profile.last_seen.unwrap() >= first_seen);

    // reconnecting re-arms the hook and flips back online
    one.connection.go_online();
    let mut rx = one.session.subscribe_profile();
    wait_for(&mut rx, |p| p.as_ref().is_some_and(|p| p.is_online()))
        .await
        .unwrap();
    assert!(backend.profile("1").unwrap().is_online());
}

#[tokio::test]
async fn test_offline_writes_are_rejected() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();
    let chat = ChatStream::new(one.ctx.clone(), uid("1"), uid("2"));

    one.connection.go_offline();
    let err = chat.send_message("lost").await.unwrap_err();
    assert!(err.is_write_failure());
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_sign_up_sign_in_sign_out() {
    let backend = TestBackend::new();
    let credentials = Credentials::unique();

    let device = backend.device().unwrap();
    let user = device.auth().sign_up(credentials.sign_up()).await.unwrap();
    device.auth().sign_out().await.unwrap();
    assert!(!device.session.is_signed_in());
    assert!(!backend.profile(user.uid.as_str()).unwrap().is_online());

    let other = backend.device().unwrap();
    let again = other.auth().sign_in(credentials.sign_in()).await.unwrap();
    assert_eq!(again.uid, user.uid);
    assert!(backend.profile(user.uid.as_str()).unwrap().is_online());

    other.profiles().save_profile(profile_form("yossr")).await.unwrap();
    let mut rx = other.session.subscribe_profile();
    let own = wait_for(&mut rx, |p| p.as_ref().is_some_and(|p| p.pseudo == "yossr"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(own.id, user.uid);

    other.auth().sign_out().await.unwrap();
    assert_eq!(other.connection.pending_hooks(), 0);
    assert_eq!(backend.server.listener_count(&StorePath::connected()), 0);
    assert!(other.session.profile().is_none());
}

#[tokio::test]
async fn test_sign_in_rejections() {
    let backend = TestBackend::new();
    let credentials = Credentials::unique();
    let device = backend.device().unwrap();
    device.auth().sign_up(credentials.sign_up()).await.unwrap();
    device.auth().sign_out().await.unwrap();

    let err = device
        .auth()
        .sign_in(messenger_service::SignInRequest::new(&credentials.email, ""))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please fill in both email and password");

    let err = device
        .auth()
        .sign_in(messenger_service::SignInRequest::new(&credentials.email, "wrong-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthFailure(_)));

    let err = device
        .auth()
        .sign_up(credentials.sign_up())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthFailure(_)));
}

// ============================================================================
// Profile Image Tests
// ============================================================================

#[tokio::test]
async fn test_profile_image_upload() {
    let backend = TestBackend::new();
    let one = backend.signed_in_device("1").await.unwrap();

    let err = one
        .profiles()
        .change_profile_image(MediaKind::Library)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied { .. }));

    one.media.grant(MediaKind::Library);
    one.media.queue(MediaAsset::new(vec![7; 16], "image/jpeg"));
    let url = one
        .profiles()
        .change_profile_image(MediaKind::Library)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(backend.profile("1").unwrap().profile_image, Some(url));
    assert_eq!(backend.objects.len(), 1);
}
