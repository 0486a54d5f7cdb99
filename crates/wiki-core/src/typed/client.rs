//! BusClient - the sending side used by the web front controller.

use tracing::debug;

use super::request::ActionRequest;
use crate::bus::EventBus;
use crate::domain::{Envelope, ReplyFailure};

/// Sends typed requests to one channel and decodes the typed replies.
#[derive(Clone)]
pub struct BusClient {
    bus: EventBus,
    channel: String,
}

impl BusClient {
    pub fn new(bus: EventBus, channel: impl Into<String>) -> Self {
        Self {
            bus,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn request<T: ActionRequest>(&self, request: T) -> Result<T::Reply, ReplyFailure> {
        let body = serde_json::to_value(&request)
            .map_err(|e| ReplyFailure::bad_payload(format!("{}: {e}", T::ACTION)))?;
        let envelope = Envelope::new(body).with_action(T::ACTION);
        debug!(channel = %self.channel, message_id = %envelope.id, action = %T::ACTION, "request");

        let reply = self.bus.send(&self.channel, envelope).await?;
        serde_json::from_value(reply)
            .map_err(|e| ReplyFailure::bad_payload(format!("{} reply: {e}", T::ACTION)))
    }

    /// Send a pre-built envelope as-is (no action header is added).
    pub async fn send_raw(&self, envelope: Envelope) -> Result<serde_json::Value, ReplyFailure> {
        self.bus.send(&self.channel, envelope).await
    }
}
