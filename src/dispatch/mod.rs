//! The `dispatch` module delivers decoded messages to ordered,
//! priority-ranked handlers and distinguishes sent from received events.

pub mod registry;
pub mod traffic;

pub use registry::{Direction, EventRegistry, MessageEvent};
pub use traffic::TrafficLogger;

#[cfg(test)]
mod tests;
