use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::codec::DeviceRole;
use crate::codec::registry::CodecRegistry;
use crate::message::{Message, MessageBody};
use crate::utils::error::CodecError;

/// Writes a length-prefixed UTF-8 string. The prefix is the byte length,
/// big-endian, with no terminator.
pub fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_i32(value.len() as i32);
    buf.put_slice(value.as_bytes());
}

/// Reads a string written by [`put_string`], consuming exactly the prefix
/// and the string bytes. `field` names what is being read, for diagnostics.
pub fn get_string(buf: &mut Bytes, field: &'static str) -> Result<String, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Truncated(field));
    }
    let len = buf.get_i32();
    if len < 0 {
        return Err(CodecError::Malformed(field));
    }
    if buf.remaining() < len as usize {
        return Err(CodecError::Truncated(field));
    }
    let raw = buf.split_to(len as usize);
    String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8(field))
}

/// Serializes an envelope into one frame body.
///
/// Typed payloads go through the codec registered for the message's kind;
/// opaque payloads are appended verbatim, so a forwarded frame carries the
/// original kind tag and the original payload bytes unmodified.
pub fn encode_frame(registry: &CodecRegistry, message: &Message) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::new();
    put_string(&mut buf, message.kind());
    buf.put_i32(message.channels().len() as i32);
    for channel in message.channels() {
        put_string(&mut buf, channel);
    }
    buf.put_u8(message.self_echo() as u8);
    match message.body() {
        MessageBody::Opaque(raw) => buf.put_slice(raw),
        MessageBody::Typed(body) => {
            let codec = registry
                .lookup(message.kind())
                .ok_or_else(|| CodecError::UnknownKind(message.kind().to_string()))?;
            codec.encode(&mut buf, body.as_ref())?;
        }
    }
    Ok(buf.freeze())
}

/// Deserializes one frame body into an envelope. The caller sets the origin
/// session afterwards; it is the only field the wire does not carry.
///
/// When no codec is registered for the frame's kind, a server retains the
/// remaining bytes as an opaque payload for channel forwarding; any other
/// role gets [`CodecError::UnknownKind`] and the caller drops the frame.
pub fn decode_frame(
    registry: &CodecRegistry,
    mut frame: Bytes,
    role: DeviceRole,
) -> Result<Message, CodecError> {
    let kind = get_string(&mut frame, "message kind")?;
    if frame.remaining() < 4 {
        return Err(CodecError::Truncated("channel count"));
    }
    let count = frame.get_i32();
    if count < 0 {
        return Err(CodecError::Malformed("negative channel count"));
    }
    // Each channel costs at least its 4-byte length prefix, so a count the
    // remaining bytes cannot hold is malformed. Checked before allocating.
    if count as usize > frame.remaining() / 4 {
        return Err(CodecError::Malformed("channel count exceeds frame size"));
    }
    let mut channels = Vec::with_capacity(count as usize);
    for _ in 0..count {
        channels.push(get_string(&mut frame, "channel")?);
    }
    if frame.remaining() < 1 {
        return Err(CodecError::Truncated("self-echo flag"));
    }
    let self_echo = frame.get_u8() != 0;
    match registry.lookup(&kind) {
        Some(codec) => {
            let body = codec.decode(&mut frame)?;
            Ok(Message::from_wire(
                kind,
                channels,
                self_echo,
                MessageBody::Typed(body),
            ))
        }
        None if role == DeviceRole::Server => Ok(Message::from_wire(
            kind,
            channels,
            self_echo,
            MessageBody::Opaque(frame),
        )),
        None => Err(CodecError::UnknownKind(kind)),
    }
}
