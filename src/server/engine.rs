use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::watch;
use uuid::Uuid;

use crate::codec::{CodecRegistry, DeviceRole, decode_frame, encode_frame};
use crate::dispatch::{Direction, EventRegistry};
use crate::message::{Message, MessageBody};
use crate::server::subscriptions::SubscriptionTable;
use crate::session::Session;

/// The server routing core: the session table plus the decisions taken for
/// every received frame.
///
/// A decoded, known-kind message only fires receive-side dispatch events;
/// routing known kinds is the business of the handlers registered for them.
/// An unknown-kind frame is retained as opaque bytes and forwarded verbatim
/// to every session subscribed to one of its channels.
pub struct ServerEngine {
    codecs: Arc<CodecRegistry>,
    events: Arc<EventRegistry>,
    subscriptions: Arc<SubscriptionTable>,
    sessions: Mutex<HashMap<Uuid, Arc<Session>>>,
    session_count: watch::Sender<usize>,
    log_traffic: bool,
}

impl ServerEngine {
    pub fn new(
        codecs: Arc<CodecRegistry>,
        events: Arc<EventRegistry>,
        subscriptions: Arc<SubscriptionTable>,
        log_traffic: bool,
    ) -> Self {
        let (session_count, _) = watch::channel(0);
        Self {
            codecs,
            events,
            subscriptions,
            sessions: Mutex::new(HashMap::new()),
            session_count,
            log_traffic,
        }
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionTable> {
        &self.subscriptions
    }

    /// Registers a session that just became active.
    pub fn register_session(&self, session: Arc<Session>) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(session.id(), session);
        // Published under the lock so counts are observed in order.
        self.session_count.send_replace(sessions.len());
    }

    /// Unregisters a session whose connection became inactive and purges its
    /// subscriptions. The transition is irreversible; a reconnecting client
    /// gets a brand-new session.
    pub fn unregister_session(&self, session: &Session) {
        {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.remove(&session.id());
            self.session_count.send_replace(sessions.len());
        }
        self.subscriptions.remove_all_subscriptions(session);
    }

    /// A receiver tracking how many sessions are registered. Server shutdown
    /// waits on it reaching zero.
    pub fn session_count(&self) -> watch::Receiver<usize> {
        self.session_count.subscribe()
    }

    /// A snapshot of all currently registered sessions.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        let sessions = self.sessions.lock().unwrap();
        sessions.values().cloned().collect()
    }

    pub fn lookup_session(&self, id: Uuid) -> Option<Arc<Session>> {
        let sessions = self.sessions.lock().unwrap();
        sessions.get(&id).cloned()
    }

    /// Entry point for every frame a connection task reads.
    ///
    /// Frames that cannot be decoded at all are dropped with a warning; a
    /// connection-level fault never propagates past its own task.
    pub fn handle_frame(&self, session: &Arc<Session>, frame: Bytes) {
        match decode_frame(&self.codecs, frame, DeviceRole::Server) {
            Ok(mut message) => {
                message.set_origin(session.clone());
                match message.body() {
                    MessageBody::Opaque(_) => self.forward_message(&message),
                    MessageBody::Typed(_) => self.events.fire(&message, Direction::Received),
                }
            }
            Err(err) => {
                tracing::warn!(session = %session.id(), %err, "dropping undecodable frame");
            }
        }
    }

    /// Forwards an opaque message to every session whose subscription set
    /// intersects its channel list, at most once per session, skipping the
    /// originating session unless the self-echo flag is set.
    ///
    /// The frame is re-serialized from the original kind tag and the
    /// original payload bytes; the structured fields are never decoded. A
    /// failed write to one session does not abort the fan-out to the rest.
    pub fn forward_message(&self, message: &Message) {
        let frame = match encode_frame(&self.codecs, message) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(%err, "could not re-serialize message for forwarding");
                return;
            }
        };
        let origin = message.origin().map(|s| s.id());
        for (id, channels) in self.subscriptions.snapshot() {
            if !message.channels().iter().any(|c| channels.contains(c)) {
                continue;
            }
            if Some(id) == origin && !message.self_echo() {
                continue;
            }
            let Some(session) = self.lookup_session(id) else {
                continue;
            };
            if !session.send_frame(frame.clone(), self.log_traffic) {
                tracing::warn!(session = %id, "could not queue frame, connection is gone");
            }
        }
        self.events.fire(message, Direction::Sent);
    }

    /// Sends a typed message to every registered session, regardless of
    /// subscriptions.
    pub fn broadcast_message(&self, message: &Message) -> bool {
        let frame = match encode_frame(&self.codecs, message) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(%err, "could not encode broadcast message");
                return false;
            }
        };
        for session in self.sessions() {
            if !session.send_frame(frame.clone(), self.log_traffic) {
                tracing::warn!(session = %session.id(), "could not queue broadcast frame");
            }
        }
        self.events.fire(message, Direction::Sent);
        true
    }
}
