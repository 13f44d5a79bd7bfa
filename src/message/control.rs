use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::frame::{get_string, put_string};
use crate::codec::registry::MessageCodec;
use crate::message::envelope::{Body, Kinded};
use crate::utils::error::CodecError;

/// The channel subscription-control messages are sent through.
pub const SUBSCRIPTIONS_CHANNEL: &str = "handle-subscriptions";

/// Whether a subscription-control message adds or removes channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Add,
    Remove,
}

impl SubscriptionAction {
    /// The stable wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionAction::Add => "ADD",
            SubscriptionAction::Remove => "REMOVE",
        }
    }

    pub fn parse(name: &str) -> Result<Self, CodecError> {
        match name {
            "ADD" => Ok(SubscriptionAction::Add),
            "REMOVE" => Ok(SubscriptionAction::Remove),
            other => Err(CodecError::UnknownAction(other.to_string())),
        }
    }
}

/// The built-in message a client sends to change its server-side
/// subscriptions. The server's subscription-control handler applies it to
/// the subscription table of the session it arrived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionControl {
    pub action: SubscriptionAction,
    pub channels: Vec<String>,
}

impl SubscriptionControl {
    pub fn new<I, S>(action: SubscriptionAction, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }
}

impl Kinded for SubscriptionControl {
    const KIND: &'static str = "relaybus.subscriptions";
}

/// Wire codec for [`SubscriptionControl`]:
/// `[action as length-prefixed string][int32 count][count x length-prefixed string]`.
pub struct SubscriptionControlCodec;

impl MessageCodec for SubscriptionControlCodec {
    fn encode(&self, buf: &mut BytesMut, body: &dyn Body) -> Result<(), CodecError> {
        let msg = body
            .as_any()
            .downcast_ref::<SubscriptionControl>()
            .ok_or(CodecError::BodyMismatch(SubscriptionControl::KIND))?;
        put_string(buf, msg.action.as_str());
        buf.put_i32(msg.channels.len() as i32);
        for channel in &msg.channels {
            put_string(buf, channel);
        }
        Ok(())
    }

    fn decode(&self, frame: &mut Bytes) -> Result<Box<dyn Body>, CodecError> {
        let action = SubscriptionAction::parse(&get_string(frame, "subscription action")?)?;
        if frame.remaining() < 4 {
            return Err(CodecError::Truncated("subscription channel count"));
        }
        let count = frame.get_i32();
        if count < 0 {
            return Err(CodecError::Malformed("negative subscription channel count"));
        }
        if count as usize > frame.remaining() / 4 {
            return Err(CodecError::Malformed(
                "subscription channel count exceeds frame size",
            ));
        }
        let mut channels = Vec::with_capacity(count as usize);
        for _ in 0..count {
            channels.push(get_string(frame, "subscription channel")?);
        }
        Ok(Box::new(SubscriptionControl { action, channels }))
    }
}
