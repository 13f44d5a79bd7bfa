//! The `error` module defines the error types used on the encode/decode path.
//!
//! Network-level faults never travel through these types; they stay local to
//! the connection that detected them and are reported to callers as boolean
//! results. Codec errors carry enough detail to log why a frame was dropped.

use thiserror::Error;

/// Errors produced while encoding or decoding a wire frame.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame ended before the named field could be read in full.
    #[error("frame ended while reading {0}")]
    Truncated(&'static str),

    /// A length or count field carried a value that cannot be valid.
    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    /// A string field did not contain valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// No codec is registered for the message kind.
    #[error("no codec registered for message kind `{0}`")]
    UnknownKind(String),

    /// The payload handed to a codec was not the type the codec encodes.
    #[error("payload does not match the codec registered for `{0}`")]
    BodyMismatch(&'static str),

    /// A subscription-control frame named an action this process does not know.
    #[error("unknown subscription action `{0}`")]
    UnknownAction(String),
}
