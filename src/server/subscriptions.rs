use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use uuid::Uuid;

use crate::session::Session;

/// The server-side mapping from session to subscribed channel set.
///
/// Keyed by session identity, never by connection handle. Every operation is
/// race-free under arbitrary interleavings from different connection tasks,
/// and reads return copies so callers iterating a snapshot are unaffected by
/// concurrent mutation. The lock is held only for map access, never across a
/// network write.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: Mutex<HashMap<Uuid, HashSet<String>>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds channel subscriptions for the given session, creating its entry
    /// on first subscribe.
    pub fn add_subscriptions<I, S>(&self, session: &Session, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = self.entries.lock().unwrap();
        let set = entries.entry(session.id()).or_default();
        for channel in channels {
            set.insert(channel.into());
        }
    }

    /// Removes channel subscriptions for the given session. Removing a
    /// channel that was never added is a no-op.
    pub fn remove_subscriptions<'a, I>(&self, session: &Session, channels: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries = self.entries.lock().unwrap();
        if let Some(set) = entries.get_mut(&session.id()) {
            for channel in channels {
                set.remove(channel);
            }
        }
    }

    /// Drops the whole entry for a session. Invoked when its connection
    /// becomes inactive.
    pub fn remove_all_subscriptions(&self, session: &Session) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(&session.id());
    }

    /// A copy of the given session's current subscriptions.
    pub fn subscriptions_of(&self, session: &Session) -> HashSet<String> {
        let entries = self.entries.lock().unwrap();
        entries.get(&session.id()).cloned().unwrap_or_default()
    }

    /// A consistent copy of the whole table, for routing decisions.
    pub fn snapshot(&self) -> HashMap<Uuid, HashSet<String>> {
        let entries = self.entries.lock().unwrap();
        entries.clone()
    }
}
