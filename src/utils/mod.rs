//! The `utils` module provides common definitions used across the `relaybus`
//! transport, such as the codec error types and tracing initialisation.

pub mod error;
pub mod logging;
