use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::server::ServerEngine;
use crate::session::Session;

/// Builds the outer framing codec: 4-byte big-endian length prefix.
pub fn length_codec(max_frame_bytes: usize) -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_bytes)
        .new_codec()
}

/// Accept loop for the server listener. Spawns one connection task per
/// accepted stream and stops when the shutdown signal fires.
pub async fn run_listener(
    listener: TcpListener,
    engine: Arc<ServerEngine>,
    mut shutdown: watch::Receiver<bool>,
    max_frame_bytes: usize,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    tokio::spawn(drive_connection(
                        stream,
                        engine.clone(),
                        shutdown.clone(),
                        max_frame_bytes,
                    ));
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to accept connection");
                }
            },
        }
    }
    tracing::info!("listener stopped accepting connections");
}

/// Runs one connection: registers a session, forwards queued outbound
/// frames to the socket from a dedicated write task, and feeds every
/// received frame to the routing core. Frame ordering per connection is
/// preserved because this is the only task reading the stream.
async fn drive_connection(
    stream: TcpStream,
    engine: Arc<ServerEngine>,
    mut shutdown: watch::Receiver<bool>,
    max_frame_bytes: usize,
) {
    let (peer_addr, local_addr) = match (stream.peer_addr(), stream.local_addr()) {
        (Ok(peer), Ok(local)) => (peer, local),
        _ => return,
    };
    let framed = Framed::new(stream, length_codec(max_frame_bytes));
    let (mut sink, mut frames) = framed.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Bytes>();
    let session = Arc::new(Session::new(tx, peer_addr, local_addr));
    engine.register_session(session.clone());
    tracing::info!(session = %session.id(), client = %peer_addr, "connection active");

    let writer_session = session.id();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(err) = sink.send(frame).await {
                tracing::debug!(session = %writer_session, %err, "write failed, closing send loop");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            next = frames.next() => match next {
                Some(Ok(frame)) => engine.handle_frame(&session, frame.freeze()),
                Some(Err(err)) => {
                    // Resets and peer closes are expected; log only.
                    tracing::debug!(session = %session.id(), %err, "connection error");
                    break;
                }
                None => break,
            },
        }
    }

    engine.unregister_session(&session);
    writer.abort();
    tracing::info!(session = %session.id(), client = %peer_addr, "connection inactive");
}
