//! The `transport` module owns the raw TCP mechanics on the server side:
//! accepting connections and running the per-connection read and write
//! tasks. Frames are delimited with a 4-byte big-endian length prefix.

pub mod tcp;
