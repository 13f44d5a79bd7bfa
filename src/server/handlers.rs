use std::sync::Arc;

use crate::dispatch::MessageEvent;
use crate::message::{Message, SubscriptionAction, SubscriptionControl};
use crate::server::subscriptions::SubscriptionTable;

/// The built-in handler for [`SubscriptionControl`] messages.
///
/// Applies ADD/REMOVE to the subscription table for the session the message
/// arrived from. It mutates the table only; it never forwards.
pub struct SubscriptionControlHandler {
    subscriptions: Arc<SubscriptionTable>,
}

impl SubscriptionControlHandler {
    pub fn new(subscriptions: Arc<SubscriptionTable>) -> Self {
        Self { subscriptions }
    }
}

impl MessageEvent for SubscriptionControlHandler {
    fn on_received(&self, message: &Message) {
        let Some(control) = message.body_as::<SubscriptionControl>() else {
            return;
        };
        let Some(origin) = message.origin() else {
            tracing::warn!("subscription control without an origin session");
            return;
        };
        match control.action {
            SubscriptionAction::Add => {
                self.subscriptions
                    .add_subscriptions(origin, control.channels.iter().cloned());
            }
            SubscriptionAction::Remove => {
                self.subscriptions
                    .remove_subscriptions(origin, control.channels.iter().map(String::as_str));
            }
        }
    }
}
