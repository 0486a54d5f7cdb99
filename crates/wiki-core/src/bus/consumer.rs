use std::sync::Weak;

use tokio::sync::mpsc;

use super::event_bus::Channels;
use super::message::Message;
use crate::domain::ConsumerId;

/// The receiving end of a channel. Unregisters itself on `close` or drop.
pub struct Consumer {
    channel: String,
    consumer_id: ConsumerId,
    rx: mpsc::Receiver<Message>,
    channels: Weak<Channels>,
}

impl Consumer {
    pub(crate) fn new(
        channel: String,
        consumer_id: ConsumerId,
        rx: mpsc::Receiver<Message>,
        channels: Weak<Channels>,
    ) -> Self {
        Self {
            channel,
            consumer_id,
            rx,
            channels,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn id(&self) -> ConsumerId {
        self.consumer_id
    }

    /// Next message, or `None` once closed and drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Stop accepting new messages. Messages already queued can still be
    /// drained with `recv`.
    pub fn close(&mut self) {
        self.unregister();
        self.rx.close();
    }

    fn unregister(&self) {
        if let Some(channels) = self.channels.upgrade() {
            channels.unregister(&self.channel, self.consumer_id);
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        self.unregister();
    }
}
