//! The `client` module connects to a network server, tracks the single
//! outbound session, and mirrors the channel subscriptions the client has
//! asked the server for.

pub mod network_client;

pub use network_client::{ClientState, NetworkClient};

#[cfg(test)]
mod tests;
