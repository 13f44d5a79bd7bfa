//! The `message` module defines the envelope carried end-to-end between
//! clients and the server, together with the built-in payload types.
//!
//! A [`Message`] pairs a wire kind tag with a channel list, a self-echo flag,
//! the session it arrived from and a payload. Payloads are either decoded
//! values ([`MessageBody::Typed`]) or, on the server's fallback path, the
//! still-encoded bytes of a kind this process has no codec for
//! ([`MessageBody::Opaque`]).

pub mod control;
pub mod envelope;
pub mod text;

pub use control::{SUBSCRIPTIONS_CHANNEL, SubscriptionAction, SubscriptionControl, SubscriptionControlCodec};
pub use envelope::{Body, Kinded, Message, MessageBody};
pub use text::{TextMessage, TextMessageCodec};
