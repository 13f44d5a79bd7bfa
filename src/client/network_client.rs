use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_util::codec::Framed;

use crate::codec::{CodecRegistry, DeviceRole, decode_frame, encode_frame};
use crate::dispatch::{Direction, EventRegistry, TrafficLogger};
use crate::message::{Message, SUBSCRIPTIONS_CHANNEL, SubscriptionAction, SubscriptionControl};
use crate::session::Session;
use crate::transport::tcp::length_codec;

/// Connection state of a [`NetworkClient`]. The only transitions are
/// `Disconnected -> Connecting -> Connected -> Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Connected,
}

type Hook = Box<dyn Fn(&NetworkClient) + Send + Sync>;

/// A transport client holding at most one active session.
///
/// The codec and event registries are owned values passed in by the caller,
/// so several independent clients can coexist in one process. The local
/// subscription set is advisory only; the server is the source of truth for
/// routing.
pub struct NetworkClient {
    address: String,
    codecs: Arc<CodecRegistry>,
    events: Arc<EventRegistry>,
    subscriptions: Mutex<HashSet<String>>,
    session: Arc<Mutex<Option<Arc<Session>>>>,
    state: Arc<Mutex<ClientState>>,
    log_traffic: bool,
    max_frame_bytes: usize,
    shutdown: watch::Sender<bool>,
    on_started: Mutex<Option<Hook>>,
    on_shutdown: Mutex<Option<Hook>>,
}

impl NetworkClient {
    pub fn new(
        address: impl Into<String>,
        codecs: Arc<CodecRegistry>,
        events: Arc<EventRegistry>,
        log_traffic: bool,
        max_frame_bytes: usize,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            address: address.into(),
            codecs,
            events,
            subscriptions: Mutex::new(HashSet::new()),
            session: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(ClientState::Disconnected)),
            log_traffic,
            max_frame_bytes,
            shutdown,
            on_started: Mutex::new(None),
            on_shutdown: Mutex::new(None),
        }
    }

    /// Registers the default codecs, plus the traffic logger when traffic
    /// logging is enabled.
    pub fn initialize(&self) {
        self.codecs.register_defaults();
        if self.log_traffic {
            self.events.on_any(Arc::new(TrafficLogger));
        }
    }

    /// Hook fired after a successful connect, e.g. to auto-subscribe to
    /// default channels.
    pub fn set_on_started(&self, hook: impl Fn(&NetworkClient) + Send + Sync + 'static) {
        *self.on_started.lock().unwrap() = Some(Box::new(hook));
    }

    /// Hook fired after shutdown.
    pub fn set_on_shutdown(&self, hook: impl Fn(&NetworkClient) + Send + Sync + 'static) {
        *self.on_shutdown.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn codecs(&self) -> &Arc<CodecRegistry> {
        &self.codecs
    }

    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    /// Connects to the server and spawns the session's read and write
    /// tasks.
    ///
    /// Returns false when the server is unreachable; retrying is the
    /// caller's decision.
    pub async fn start(&self) -> bool {
        tracing::info!(address = %self.address, "connecting to network server");
        *self.state.lock().unwrap() = ClientState::Connecting;
        let stream = match TcpStream::connect(&self.address).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(address = %self.address, %err, "network server is unreachable");
                *self.state.lock().unwrap() = ClientState::Disconnected;
                return false;
            }
        };
        let (local_addr, peer_addr) = match (stream.local_addr(), stream.peer_addr()) {
            (Ok(local), Ok(peer)) => (local, peer),
            _ => {
                *self.state.lock().unwrap() = ClientState::Disconnected;
                return false;
            }
        };
        let framed = Framed::new(stream, length_codec(self.max_frame_bytes));
        let (mut sink, mut frames) = framed.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
        let session = Arc::new(Session::new(tx, local_addr, peer_addr));
        *self.session.lock().unwrap() = Some(session.clone());
        *self.state.lock().unwrap() = ClientState::Connected;

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(err) = sink.send(frame).await {
                    tracing::debug!(%err, "write failed, closing send loop");
                    break;
                }
            }
        });

        let codecs = self.codecs.clone();
        let events = self.events.clone();
        let session_slot = self.session.clone();
        let state_slot = self.state.clone();
        let address = self.address.clone();
        let mut shutdown = self.shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    next = frames.next() => match next {
                        Some(Ok(frame)) => {
                            match decode_frame(&codecs, frame.freeze(), DeviceRole::Client) {
                                Ok(mut message) => {
                                    message.set_origin(session.clone());
                                    events.fire(&message, Direction::Received);
                                }
                                Err(err) => {
                                    tracing::warn!(%err, "dropping undecodable frame");
                                }
                            }
                        }
                        Some(Err(err)) => {
                            tracing::debug!(%err, "connection error");
                            break;
                        }
                        None => break,
                    },
                }
            }
            *session_slot.lock().unwrap() = None;
            *state_slot.lock().unwrap() = ClientState::Disconnected;
            tracing::info!(address = %address, "disconnected from network server");
        });

        tracing::info!(address = %self.address, "connected to network server");
        self.fire_on_started();
        true
    }

    fn fire_on_started(&self) {
        if let Some(hook) = &*self.on_started.lock().unwrap() {
            hook(self);
        }
    }

    pub fn state(&self) -> ClientState {
        *self.state.lock().unwrap()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ClientState::Connected
    }

    /// Attaches the given channels to the message and sends it through the
    /// active session, firing sent-side events on success. Fails when no
    /// session is active.
    pub fn send(&self, mut message: Message, channels: &[&str]) -> bool {
        message.add_channels(channels.iter().copied());
        let session = self.session.lock().unwrap().clone();
        let Some(session) = session else {
            tracing::warn!("cannot send, no active session");
            return false;
        };
        let frame = match encode_frame(&self.codecs, &message) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(%err, "could not encode message");
                return false;
            }
        };
        if !session.send_frame(frame, self.log_traffic) {
            return false;
        }
        self.events.fire(&message, Direction::Sent);
        true
    }

    /// Whether this client believes it is subscribed to the channel.
    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.subscriptions.lock().unwrap().contains(channel)
    }

    /// A copy of the local subscription mirror.
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().iter().cloned().collect()
    }

    /// Updates the local mirror and asks the server to add the channels to
    /// this session's subscriptions.
    pub fn add_subscriptions(&self, channels: &[&str]) -> bool {
        {
            let mut subscriptions = self.subscriptions.lock().unwrap();
            subscriptions.extend(channels.iter().map(|c| c.to_string()));
        }
        let control = SubscriptionControl::new(SubscriptionAction::Add, channels.iter().copied());
        self.send(Message::new(control), &[SUBSCRIPTIONS_CHANNEL])
    }

    /// Updates the local mirror and asks the server to drop the channels
    /// from this session's subscriptions.
    pub fn remove_subscriptions(&self, channels: &[&str]) -> bool {
        {
            let mut subscriptions = self.subscriptions.lock().unwrap();
            for channel in channels {
                subscriptions.remove(*channel);
            }
        }
        let control =
            SubscriptionControl::new(SubscriptionAction::Remove, channels.iter().copied());
        self.send(Message::new(control), &[SUBSCRIPTIONS_CHANNEL])
    }

    /// Releases the connection and fires the shutdown hook.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        *self.session.lock().unwrap() = None;
        *self.state.lock().unwrap() = ClientState::Disconnected;
        if let Some(hook) = &*self.on_shutdown.lock().unwrap() {
            hook(self);
        }
        tracing::info!(address = %self.address, "client shut down");
    }
}
