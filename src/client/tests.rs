use std::sync::Arc;

use super::{ClientState, NetworkClient};
use crate::codec::CodecRegistry;
use crate::dispatch::EventRegistry;
use crate::message::{Message, TextMessage, TextMessageCodec};
use crate::message::envelope::Kinded;

fn offline_client() -> Arc<NetworkClient> {
    let client = Arc::new(NetworkClient::new(
        "127.0.0.1:1",
        Arc::new(CodecRegistry::new()),
        Arc::new(EventRegistry::new()),
        false,
        1024 * 1024,
    ));
    client.initialize();
    client
        .codecs()
        .register(TextMessage::KIND, Arc::new(TextMessageCodec));
    client
}

#[test]
fn a_new_client_is_disconnected() {
    let client = offline_client();
    assert_eq!(client.state(), ClientState::Disconnected);
    assert!(!client.is_connected());
}

#[test]
fn send_fails_without_an_active_session() {
    let client = offline_client();
    let message = Message::new(TextMessage::new("nobody hears this"));
    assert!(!client.send(message, &["room1"]));
}

#[test]
fn the_local_mirror_tracks_subscriptions_even_while_disconnected() {
    let client = offline_client();

    // The control message cannot be sent, but the advisory mirror updates.
    assert!(!client.add_subscriptions(&["room1", "room2"]));
    assert!(client.is_subscribed("room1"));
    assert!(client.is_subscribed("room2"));
    assert_eq!(client.subscriptions().len(), 2);

    assert!(!client.remove_subscriptions(&["room1", "never-added"]));
    assert!(!client.is_subscribed("room1"));
    assert!(client.is_subscribed("room2"));
}

#[tokio::test]
async fn connecting_to_an_unreachable_server_fails() {
    let client = offline_client();
    assert!(!client.start().await);
    assert_eq!(client.state(), ClientState::Disconnected);
}
