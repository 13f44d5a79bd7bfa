use crate::dispatch::registry::MessageEvent;
use crate::message::Message;

/// An unbound handler that logs every sent and received message with its
/// kind and channel list. Registered by servers and clients that start with
/// traffic logging enabled.
pub struct TrafficLogger;

impl MessageEvent for TrafficLogger {
    fn on_received(&self, message: &Message) {
        tracing::info!(
            kind = message.kind(),
            channels = message.channels().join(", "),
            "[<-]"
        );
    }

    fn on_sent(&self, message: &Message) {
        tracing::info!(
            kind = message.kind(),
            channels = message.channels().join(", "),
            "[->]"
        );
    }
}
