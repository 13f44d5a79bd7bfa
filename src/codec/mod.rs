//! The `codec` module turns typed in-memory messages into length-prefixed
//! binary frames and back.
//!
//! A frame is laid out as
//!
//! ```text
//! [int32 kind length][kind bytes, UTF-8]
//! [int32 channel count]
//!   repeated: [int32 length][utf8 bytes]
//! [1 byte self-echo flag]
//! [payload bytes, produced by the codec registered for the kind]
//! ```
//!
//! with all integers big-endian. The outer per-frame length prefix is the
//! transport's business (`tokio_util`'s length-delimited codec); everything
//! inside it is handled here.

pub mod frame;
pub mod registry;

pub use frame::{decode_frame, encode_frame};
pub use registry::{CodecRegistry, MessageCodec};

/// Which side of the transport is decoding. The server falls back to opaque
/// forwarding for unknown kinds; a client has nowhere to forward to and
/// drops such frames instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Server,
    Client,
}
