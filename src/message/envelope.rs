use std::any::Any;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::session::Session;

/// A payload value that can be carried inside a [`Message`].
///
/// Implemented automatically for every `Send + Sync + Debug + 'static` type;
/// the `as_any` hook is what lets handlers recover the concrete type through
/// a checked downcast instead of an unchecked cast.
pub trait Body: Send + Sync + fmt::Debug + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Send + Sync + fmt::Debug + 'static> Body for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Associates a payload type with its stable wire kind tag.
///
/// The tag must be unique per process; it is what the codec registry keys on
/// and what travels in the frame header.
pub trait Kinded {
    const KIND: &'static str;
}

/// The payload half of an envelope.
#[derive(Debug)]
pub enum MessageBody {
    /// A decoded, concrete payload value.
    Typed(Box<dyn Body>),
    /// The verbatim payload bytes of a kind this process cannot decode.
    /// Only the server produces this variant; it is consumed by channel
    /// forwarding and re-serialized without a decode/re-encode round trip.
    Opaque(Bytes),
}

/// The typed envelope carried end-to-end.
///
/// `channels` is never absent; an empty list means the message targets no
/// channel in particular (broadcast is an explicit server operation, not a
/// channel-list convention for opaque traffic). `origin` is set exactly once,
/// by the receiving side, immediately after decode.
#[derive(Debug)]
pub struct Message {
    kind: String,
    channels: Vec<String>,
    origin: Option<Arc<Session>>,
    self_echo: bool,
    body: MessageBody,
}

impl Message {
    /// Creates a local, not-yet-sent message around a typed payload.
    pub fn new<T>(body: T) -> Self
    where
        T: Body + Kinded,
    {
        Self {
            kind: T::KIND.to_string(),
            channels: Vec::new(),
            origin: None,
            self_echo: false,
            body: MessageBody::Typed(Box::new(body)),
        }
    }

    /// Reassembles an envelope on the receive path, after the frame header
    /// has been read.
    pub(crate) fn from_wire(
        kind: String,
        channels: Vec<String>,
        self_echo: bool,
        body: MessageBody,
    ) -> Self {
        Self {
            kind,
            channels,
            origin: None,
            self_echo,
            body,
        }
    }

    /// The wire kind tag the codec registry resolves codecs by.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The channels this message targets.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Adds channels to the target list. Duplicates are ignored.
    pub fn add_channels<I, S>(&mut self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for channel in channels {
            let channel = channel.into();
            if !self.channels.contains(&channel) {
                self.channels.push(channel);
            }
        }
    }

    /// Removes channels from the target list.
    pub fn remove_channels(&mut self, channels: &[&str]) {
        self.channels.retain(|c| !channels.contains(&c.as_str()));
    }

    /// Whether the server should deliver the message back to its sender
    /// during channel forwarding.
    pub fn self_echo(&self) -> bool {
        self.self_echo
    }

    pub fn set_self_echo(&mut self, value: bool) {
        self.self_echo = value;
    }

    /// The session this message arrived from. `None` for locally-created,
    /// not-yet-sent messages.
    pub fn origin(&self) -> Option<&Arc<Session>> {
        self.origin.as_ref()
    }

    /// Records the session a received message arrived from. Called once by
    /// the receive path; the origin is never mutated afterwards.
    pub(crate) fn set_origin(&mut self, session: Arc<Session>) {
        debug_assert!(self.origin.is_none(), "origin is set once, on receive");
        self.origin = Some(session);
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// Checked access to a typed payload. Returns `None` for opaque payloads
    /// or when the payload is some other type.
    pub fn body_as<T: Body>(&self) -> Option<&T> {
        match &self.body {
            MessageBody::Typed(body) => body.as_ref().as_any().downcast_ref(),
            MessageBody::Opaque(_) => None,
        }
    }

    /// The raw payload bytes of an opaque message.
    pub fn opaque_payload(&self) -> Option<&Bytes> {
        match &self.body {
            MessageBody::Typed(_) => None,
            MessageBody::Opaque(raw) => Some(raw),
        }
    }
}
