use std::sync::{Arc, Mutex};

use super::{Direction, EventRegistry, MessageEvent};
use crate::message::envelope::Kinded;
use crate::message::{Message, SubscriptionControl, SubscriptionAction, TextMessage};

struct Recorder {
    id: usize,
    log: Arc<Mutex<Vec<(usize, Direction)>>>,
}

impl MessageEvent for Recorder {
    fn on_received(&self, _message: &Message) {
        self.log.lock().unwrap().push((self.id, Direction::Received));
    }

    fn on_sent(&self, _message: &Message) {
        self.log.lock().unwrap().push((self.id, Direction::Sent));
    }
}

fn recorder(id: usize, log: &Arc<Mutex<Vec<(usize, Direction)>>>) -> Arc<dyn MessageEvent> {
    Arc::new(Recorder {
        id,
        log: log.clone(),
    })
}

#[test]
fn handlers_fire_in_registration_order() {
    let registry = EventRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    // An unbound handler registered between two kind-bound ones fires at its
    // own registration position, not always first or last.
    registry.on_kind(TextMessage::KIND, recorder(1, &log));
    registry.on_any(recorder(2, &log));
    registry.on_kind(TextMessage::KIND, recorder(3, &log));

    registry.fire(&Message::new(TextMessage::new("hi")), Direction::Received);
    let fired: Vec<usize> = log.lock().unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(fired, [1, 2, 3]);
}

#[test]
fn kind_bound_handlers_only_fire_for_their_kind() {
    let registry = EventRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    registry.on_kind(TextMessage::KIND, recorder(1, &log));
    registry.on_any(recorder(2, &log));

    let other = Message::new(SubscriptionControl::new(SubscriptionAction::Add, ["a"]));
    registry.fire(&other, Direction::Received);
    let fired: Vec<usize> = log.lock().unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(fired, [2]);
}

#[test]
fn fire_distinguishes_sent_from_received() {
    let registry = EventRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    registry.on_any(recorder(1, &log));

    let message = Message::new(TextMessage::new("hi"));
    registry.fire(&message, Direction::Sent);
    registry.fire(&message, Direction::Received);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        [(1, Direction::Sent), (1, Direction::Received)]
    );
}

#[test]
fn removed_handlers_no_longer_fire() {
    let registry = EventRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let bound = recorder(1, &log);
    let unbound = recorder(2, &log);
    registry.on_kind(TextMessage::KIND, bound.clone());
    registry.on_any(unbound.clone());

    registry.remove_kind(TextMessage::KIND, &bound);
    registry.remove_any(&unbound);
    registry.fire(&Message::new(TextMessage::new("hi")), Direction::Received);
    assert!(log.lock().unwrap().is_empty());
}

struct Panicker;

impl MessageEvent for Panicker {
    fn on_received(&self, _message: &Message) {
        panic!("handler fault");
    }
}

#[test]
fn a_panicking_handler_does_not_stop_the_rest() {
    let registry = EventRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    registry.on_any(Arc::new(Panicker));
    registry.on_any(recorder(1, &log));

    registry.fire(&Message::new(TextMessage::new("hi")), Direction::Received);
    let fired: Vec<usize> = log.lock().unwrap().iter().map(|(id, _)| *id).collect();
    assert_eq!(fired, [1]);
}
