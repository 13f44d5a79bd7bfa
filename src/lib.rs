//! # relaybus
//!
//! `relaybus` is a channel-routed message transport built with Rust. A TCP
//! server accepts connections from many clients; each client subscribes to
//! named channels, and messages published by any client are routed only to
//! the clients subscribed to the message's target channels, broadcast to
//! all, or echoed back to the sender.
//!
//! ## Core Modules
//!
//! - `codec`: wire frame primitives and the string-keyed codec registry,
//!   including the opaque fallback for kinds the server cannot decode.
//! - `message`: the envelope carried end-to-end and the built-in payloads.
//! - `dispatch`: ordered, priority-ranked handler registration fired on the
//!   send and receive paths.
//! - `session`: the handle to one live connection.
//! - `server`: the session/subscription registries and the routing core.
//! - `transport`: the TCP accept loop and per-connection tasks.
//! - `client`: the client connection core and its subscription mirror.
//! - `config`: loading and managing configuration.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod message;
pub mod server;
pub mod session;
pub mod transport;
pub mod utils;
