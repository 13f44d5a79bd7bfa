use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};

use crate::message::control::{SubscriptionControl, SubscriptionControlCodec};
use crate::message::envelope::{Body, Kinded};
use crate::utils::error::CodecError;

/// A pair of pure functions converting between a typed payload and its
/// binary wire form.
///
/// `encode` must write exactly the bytes a matching `decode` can reconstruct
/// into an equal payload, and `decode` must consume exactly what `encode`
/// produced; codecs must not over- or under-read.
pub trait MessageCodec: Send + Sync {
    fn encode(&self, buf: &mut BytesMut, body: &dyn Body) -> Result<(), CodecError>;
    fn decode(&self, frame: &mut Bytes) -> Result<Box<dyn Body>, CodecError>;
}

/// Maps a message kind tag to its codec.
///
/// All operations are safe under concurrent registration and lookup from
/// different connection tasks. Callers of [`lookup`](Self::lookup) must
/// handle absence; removing an entry makes future frames of that kind fall
/// back to opaque forwarding on the server, or become undeliverable on a
/// client.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: Mutex<HashMap<String, Arc<dyn MessageCodec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in codecs: currently the subscription-control
    /// message.
    pub fn register_defaults(&self) {
        self.register(SubscriptionControl::KIND, Arc::new(SubscriptionControlCodec));
    }

    /// Registers a codec for `kind`, silently replacing any existing entry.
    pub fn register(&self, kind: &str, codec: Arc<dyn MessageCodec>) {
        let mut codecs = self.codecs.lock().unwrap();
        codecs.insert(kind.to_string(), codec);
    }

    pub fn unregister(&self, kind: &str) {
        let mut codecs = self.codecs.lock().unwrap();
        codecs.remove(kind);
    }

    pub fn is_registered(&self, kind: &str) -> bool {
        let codecs = self.codecs.lock().unwrap();
        codecs.contains_key(kind)
    }

    pub fn lookup(&self, kind: &str) -> Option<Arc<dyn MessageCodec>> {
        let codecs = self.codecs.lock().unwrap();
        codecs.get(kind).cloned()
    }
}
