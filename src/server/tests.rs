use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use super::engine::ServerEngine;
use super::handlers::SubscriptionControlHandler;
use super::subscriptions::SubscriptionTable;
use crate::codec::{CodecRegistry, DeviceRole, decode_frame, encode_frame};
use crate::dispatch::EventRegistry;
use crate::message::envelope::Kinded;
use crate::message::{
    Message, SubscriptionAction, SubscriptionControl, TextMessage, TextMessageCodec,
};
use crate::session::Session;

fn test_session() -> (Arc<Session>, mpsc::UnboundedReceiver<Bytes>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    (Arc::new(Session::new(tx, addr, addr)), rx)
}

/// An engine the way `NetworkServer::initialize` wires one up: default
/// codecs plus the subscription-control handler.
fn test_engine() -> ServerEngine {
    let codecs = Arc::new(CodecRegistry::new());
    codecs.register_defaults();
    let events = Arc::new(EventRegistry::new());
    let subscriptions = Arc::new(SubscriptionTable::new());
    events.on_kind(
        SubscriptionControl::KIND,
        Arc::new(SubscriptionControlHandler::new(subscriptions.clone())),
    );
    ServerEngine::new(codecs, events, subscriptions, false)
}

/// Encodes a message the way a client with the text codec would.
fn client_frame(message: &Message) -> Bytes {
    let codecs = CodecRegistry::new();
    codecs.register_defaults();
    codecs.register(TextMessage::KIND, Arc::new(TextMessageCodec));
    encode_frame(&codecs, message).unwrap()
}

fn text_frame(text: &str, channels: &[&str], self_echo: bool) -> Bytes {
    let mut message = Message::new(TextMessage::new(text));
    message.add_channels(channels.iter().copied());
    message.set_self_echo(self_echo);
    client_frame(&message)
}

fn received_text(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> Option<String> {
    let frame = rx.try_recv().ok()?;
    let codecs = CodecRegistry::new();
    codecs.register(TextMessage::KIND, Arc::new(TextMessageCodec));
    let message = decode_frame(&codecs, frame, DeviceRole::Client).unwrap();
    Some(message.body_as::<TextMessage>().unwrap().text.clone())
}

#[test]
fn subscription_table_add_and_remove() {
    let table = SubscriptionTable::new();
    let (session, _rx) = test_session();

    table.add_subscriptions(&session, ["a", "b"]);
    table.add_subscriptions(&session, ["b", "c"]);
    let subs = table.subscriptions_of(&session);
    assert_eq!(subs.len(), 3);

    table.remove_subscriptions(&session, ["b", "never-added"]);
    let subs = table.subscriptions_of(&session);
    assert!(subs.contains("a") && subs.contains("c") && !subs.contains("b"));

    table.remove_all_subscriptions(&session);
    assert!(table.subscriptions_of(&session).is_empty());
}

#[test]
fn removing_from_an_unknown_session_is_a_no_op() {
    let table = SubscriptionTable::new();
    let (session, _rx) = test_session();
    table.remove_subscriptions(&session, ["a"]);
    table.remove_all_subscriptions(&session);
    assert!(table.subscriptions_of(&session).is_empty());
}

#[test]
fn subscription_control_frames_mutate_the_table() {
    let engine = test_engine();
    let (session, _rx) = test_session();
    engine.register_session(session.clone());

    let add = Message::new(SubscriptionControl::new(
        SubscriptionAction::Add,
        ["room1", "room2"],
    ));
    engine.handle_frame(&session, client_frame(&add));
    let subs = engine.subscriptions().subscriptions_of(&session);
    assert!(subs.contains("room1") && subs.contains("room2"));

    let remove = Message::new(SubscriptionControl::new(SubscriptionAction::Remove, ["room1"]));
    engine.handle_frame(&session, client_frame(&remove));
    let subs = engine.subscriptions().subscriptions_of(&session);
    assert!(!subs.contains("room1") && subs.contains("room2"));
}

#[test]
fn opaque_messages_reach_subscribed_sessions_only() {
    let engine = test_engine();
    let (a, mut rx_a) = test_session();
    let (b, mut rx_b) = test_session();
    let (c, mut rx_c) = test_session();
    let (d, mut rx_d) = test_session();
    for session in [&a, &b, &c, &d] {
        engine.register_session(session.clone());
    }
    engine.subscriptions().add_subscriptions(&a, ["x"]);
    engine.subscriptions().add_subscriptions(&b, ["x"]);
    engine.subscriptions().add_subscriptions(&d, ["y"]);

    engine.handle_frame(&c, text_frame("to x", &["x"], false));

    assert_eq!(received_text(&mut rx_a).as_deref(), Some("to x"));
    assert_eq!(received_text(&mut rx_b).as_deref(), Some("to x"));
    assert!(received_text(&mut rx_c).is_none());
    assert!(received_text(&mut rx_d).is_none());
}

#[test]
fn a_session_is_forwarded_to_at_most_once() {
    let engine = test_engine();
    let (a, mut rx_a) = test_session();
    let (b, _rx_b) = test_session();
    engine.register_session(a.clone());
    engine.register_session(b.clone());
    engine.subscriptions().add_subscriptions(&a, ["x", "y"]);

    engine.handle_frame(&b, text_frame("both channels", &["x", "y"], false));

    assert_eq!(received_text(&mut rx_a).as_deref(), Some("both channels"));
    assert!(received_text(&mut rx_a).is_none());
}

#[test]
fn self_echo_controls_delivery_to_the_origin() {
    let engine = test_engine();
    let (a, mut rx_a) = test_session();
    engine.register_session(a.clone());
    engine.subscriptions().add_subscriptions(&a, ["x"]);

    engine.handle_frame(&a, text_frame("quiet", &["x"], false));
    assert!(received_text(&mut rx_a).is_none());

    engine.handle_frame(&a, text_frame("loud", &["x"], true));
    assert_eq!(received_text(&mut rx_a).as_deref(), Some("loud"));
}

#[test]
fn unregistering_a_session_purges_it_from_routing() {
    let engine = test_engine();
    let (a, mut rx_a) = test_session();
    let (b, _rx_b) = test_session();
    engine.register_session(a.clone());
    engine.register_session(b.clone());
    engine.subscriptions().add_subscriptions(&a, ["x"]);

    engine.unregister_session(&a);
    assert!(engine.subscriptions().subscriptions_of(&a).is_empty());
    assert!(engine.lookup_session(a.id()).is_none());

    engine.handle_frame(&b, text_frame("gone", &["x"], false));
    assert!(received_text(&mut rx_a).is_none());
}

#[test]
fn a_stale_session_does_not_abort_the_fanout() {
    let engine = test_engine();
    let (a, rx_a) = test_session();
    let (b, mut rx_b) = test_session();
    let (c, _rx_c) = test_session();
    engine.register_session(a.clone());
    engine.register_session(b.clone());
    engine.register_session(c.clone());
    engine.subscriptions().add_subscriptions(&a, ["x"]);
    engine.subscriptions().add_subscriptions(&b, ["x"]);

    // A's write task is gone; the send to it fails but B is still served.
    drop(rx_a);
    engine.handle_frame(&c, text_frame("survives", &["x"], false));
    assert_eq!(received_text(&mut rx_b).as_deref(), Some("survives"));
}

#[test]
fn broadcast_ignores_subscriptions() {
    let engine = test_engine();
    engine
        .codecs()
        .register(TextMessage::KIND, Arc::new(TextMessageCodec));
    let (a, mut rx_a) = test_session();
    let (b, mut rx_b) = test_session();
    engine.register_session(a.clone());
    engine.register_session(b.clone());
    engine.subscriptions().add_subscriptions(&a, ["x"]);

    assert!(engine.broadcast_message(&Message::new(TextMessage::new("all hands"))));
    assert_eq!(received_text(&mut rx_a).as_deref(), Some("all hands"));
    assert_eq!(received_text(&mut rx_b).as_deref(), Some("all hands"));
}

#[test]
fn sessions_snapshot_is_a_copy() {
    let engine = test_engine();
    let (a, _rx_a) = test_session();
    engine.register_session(a.clone());
    let snapshot = engine.sessions();
    engine.unregister_session(&a);
    assert_eq!(snapshot.len(), 1);
    assert!(engine.sessions().is_empty());
}
