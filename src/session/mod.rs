//! The `session` module wraps one live connection.
//!
//! A [`Session`] owns the outbound half of its connection (a channel into
//! the connection's write task) and the address pair resolved when the
//! connection became active. It is registered in exactly one place at a
//! time: the server's session table, or the single active-session slot on a
//! client.

use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// The server-or-client-side handle to one live connection.
///
/// Sessions compare equal by id; a reconnecting peer always gets a brand-new
/// session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    outbound: UnboundedSender<Bytes>,
    client_addr: SocketAddr,
    server_addr: SocketAddr,
}

impl Session {
    /// Creates a session around the outbound channel of a connection that
    /// just became active. On the server, `client_addr` is the peer address
    /// and `server_addr` the local one; on a client the two are mirrored.
    pub fn new(
        outbound: UnboundedSender<Bytes>,
        client_addr: SocketAddr,
        server_addr: SocketAddr,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbound,
            client_addr,
            server_addr,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Queues an encoded frame for transmission, optionally logging it.
    ///
    /// Returns false when the connection's write task is gone, which the
    /// caller treats as a stale connection, never as a fault to propagate.
    pub fn send_frame(&self, frame: Bytes, log_traffic: bool) -> bool {
        if log_traffic {
            tracing::info!(session = %self.id, bytes = frame.len(), "queueing outbound frame");
        }
        self.outbound.send(frame).is_ok()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Session {}
