//! The `server` module hosts the routing core: the session and subscription
//! registries, the built-in subscription-control handler, and the
//! [`NetworkServer`] that binds a TCP listener and drives it all.

pub mod engine;
pub mod handlers;
pub mod subscriptions;

pub use engine::ServerEngine;
pub use handlers::SubscriptionControlHandler;
pub use subscriptions::SubscriptionTable;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::codec::CodecRegistry;
use crate::config::Settings;
use crate::dispatch::{EventRegistry, TrafficLogger};
use crate::message::{Message, SubscriptionControl};
use crate::message::envelope::Kinded;
use crate::transport::tcp::run_listener;

/// A transport server that accepts client connections and routes messages
/// between them by channel.
///
/// The codec and event registries are owned values passed in by the caller,
/// so several independent servers can coexist in one process.
pub struct NetworkServer {
    engine: Arc<ServerEngine>,
    address: String,
    max_frame_bytes: usize,
    log_traffic: bool,
    shutdown: watch::Sender<bool>,
    running: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl NetworkServer {
    pub fn new(
        settings: &Settings,
        codecs: Arc<CodecRegistry>,
        events: Arc<EventRegistry>,
    ) -> Self {
        let subscriptions = Arc::new(SubscriptionTable::new());
        let log_traffic = settings.transport.log_traffic;
        let engine = Arc::new(ServerEngine::new(codecs, events, subscriptions, log_traffic));
        let (shutdown, _) = watch::channel(false);
        Self {
            engine,
            address: format!("{}:{}", settings.server.host, settings.server.port),
            max_frame_bytes: settings.transport.max_frame_bytes,
            log_traffic,
            shutdown,
            running: AtomicBool::new(false),
            local_addr: Mutex::new(None),
        }
    }

    /// Registers the default codecs and the built-in handlers: the
    /// subscription-control handler, plus the traffic logger when traffic
    /// logging is enabled.
    pub fn initialize(&self) {
        self.engine.codecs().register_defaults();
        self.engine.events().on_kind(
            SubscriptionControl::KIND,
            Arc::new(SubscriptionControlHandler::new(
                self.engine.subscriptions().clone(),
            )),
        );
        if self.log_traffic {
            self.engine.events().on_any(Arc::new(TrafficLogger));
        }
    }

    /// Binds the listener and spawns the accept loop.
    ///
    /// Returns false when the bind fails; there is no automatic retry.
    pub async fn start(&self) -> bool {
        tracing::info!(address = %self.address, "starting up network server");
        let listener = match TcpListener::bind(&self.address).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::warn!(address = %self.address, %err, "could not bind network server");
                return false;
            }
        };
        let bound = listener.local_addr().ok();
        *self.local_addr.lock().unwrap() = bound;
        self.running.store(true, Ordering::SeqCst);
        tokio::spawn(run_listener(
            listener,
            self.engine.clone(),
            self.shutdown.subscribe(),
            self.max_frame_bytes,
        ));
        self.on_started();
        true
    }

    fn on_started(&self) {
        tracing::info!(address = %self.address, "network server is accepting connections");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The address the listener actually bound to. Useful when the
    /// configured port is 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap()
    }

    pub fn engine(&self) -> &Arc<ServerEngine> {
        &self.engine
    }

    /// Sends a typed message to every connected session, regardless of
    /// subscriptions.
    pub fn broadcast_message(&self, message: &Message) -> bool {
        self.engine.broadcast_message(message)
    }

    /// Cooperative shutdown: stops accepting connections, closes every
    /// session and returns only once the per-session registry entries have
    /// drained.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let mut count = self.engine.session_count();
        while *count.borrow_and_update() != 0 {
            if count.changed().await.is_err() {
                break;
            }
        }
        self.running.store(false, Ordering::SeqCst);
        self.on_shutdown();
    }

    fn on_shutdown(&self) {
        tracing::info!(address = %self.address, "network server shut down");
    }
}

#[cfg(test)]
mod tests;
