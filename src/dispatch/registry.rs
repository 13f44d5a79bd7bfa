use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::message::Message;

/// Whether a fired event describes a message this process sent or received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// A handler invoked when messages are sent or received.
///
/// Both hooks default to doing nothing so implementors can override only the
/// direction they care about.
pub trait MessageEvent: Send + Sync {
    fn on_received(&self, _message: &Message) {}
    fn on_sent(&self, _message: &Message) {}
}

type Entry = (Arc<dyn MessageEvent>, u64);

#[derive(Default)]
struct Registered {
    kind_bound: HashMap<String, Vec<Entry>>,
    unbound: Vec<Entry>,
    next_priority: u64,
}

/// Ordered handler registration, per message kind and for all messages.
///
/// Priorities are assigned by an internal monotonic counter at registration
/// time: lower value means registered earlier means fires first, and a fire
/// merges kind-bound and unbound handlers into one strictly-ordered
/// sequence. Entries are never reordered after insertion except by removal.
#[derive(Default)]
pub struct EventRegistry {
    inner: Mutex<Registered>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler fired for every message, sent or received.
    pub fn on_any(&self, event: Arc<dyn MessageEvent>) {
        let mut inner = self.inner.lock().unwrap();
        let priority = inner.next_priority;
        inner.next_priority += 1;
        inner.unbound.push((event, priority));
    }

    /// Registers a handler fired for messages of the given kind only.
    pub fn on_kind(&self, kind: &str, event: Arc<dyn MessageEvent>) {
        let mut inner = self.inner.lock().unwrap();
        let priority = inner.next_priority;
        inner.next_priority += 1;
        inner
            .kind_bound
            .entry(kind.to_string())
            .or_default()
            .push((event, priority));
    }

    /// Removes an unbound handler by identity.
    pub fn remove_any(&self, event: &Arc<dyn MessageEvent>) {
        let mut inner = self.inner.lock().unwrap();
        inner.unbound.retain(|(h, _)| !Arc::ptr_eq(h, event));
    }

    /// Removes a kind-bound handler by identity.
    pub fn remove_kind(&self, kind: &str, event: &Arc<dyn MessageEvent>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entries) = inner.kind_bound.get_mut(kind) {
            entries.retain(|(h, _)| !Arc::ptr_eq(h, event));
        }
    }

    /// Removes every handler bound to the given kind.
    pub fn remove_all_for_kind(&self, kind: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.kind_bound.remove(kind);
    }

    /// Fires all handlers matching `message`, synchronously on the calling
    /// task, in ascending registration-priority order.
    ///
    /// The handler list is snapshotted before the first invocation, so
    /// handlers may re-register without deadlocking. A panicking handler is
    /// logged and does not stop the remaining handlers from running.
    pub fn fire(&self, message: &Message, direction: Direction) {
        let handlers = {
            let inner = self.inner.lock().unwrap();
            let mut merged: Vec<Entry> = inner
                .kind_bound
                .get(message.kind())
                .into_iter()
                .flatten()
                .chain(inner.unbound.iter())
                .cloned()
                .collect();
            merged.sort_by_key(|(_, priority)| *priority);
            merged
        };
        for (handler, _) in handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| match direction {
                Direction::Received => handler.on_received(message),
                Direction::Sent => handler.on_sent(message),
            }));
            if outcome.is_err() {
                tracing::warn!(kind = message.kind(), "message event handler panicked");
            }
        }
    }
}
