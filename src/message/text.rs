use bytes::{Bytes, BytesMut};

use crate::codec::frame::{get_string, put_string};
use crate::codec::registry::MessageCodec;
use crate::message::envelope::{Body, Kinded};
use crate::utils::error::CodecError;

/// A plain text payload. Not part of the default codec set; clients that
/// want to exchange text register [`TextMessageCodec`] themselves, which on a
/// stock server makes text traffic travel the opaque forwarding path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub text: String,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Kinded for TextMessage {
    const KIND: &'static str = "relaybus.text";
}

/// Wire codec for [`TextMessage`]: a single length-prefixed string.
pub struct TextMessageCodec;

impl MessageCodec for TextMessageCodec {
    fn encode(&self, buf: &mut BytesMut, body: &dyn Body) -> Result<(), CodecError> {
        let msg = body
            .as_any()
            .downcast_ref::<TextMessage>()
            .ok_or(CodecError::BodyMismatch(TextMessage::KIND))?;
        put_string(buf, &msg.text);
        Ok(())
    }

    fn decode(&self, frame: &mut Bytes) -> Result<Box<dyn Body>, CodecError> {
        Ok(Box::new(TextMessage {
            text: get_string(frame, "text")?,
        }))
    }
}
