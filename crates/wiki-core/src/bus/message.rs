use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::{Envelope, MessageId, ReplyFailure};

pub(crate) type ReplySlot = oneshot::Sender<Result<serde_json::Value, ReplyFailure>>;

/// A received request. Must be answered exactly once; dropping it unanswered
/// reports `NoReply` to the sender.
#[derive(Debug)]
pub struct Message {
    channel: String,
    envelope: Envelope,
    reply_to: ReplySlot,
}

impl Message {
    pub(crate) fn new(channel: String, envelope: Envelope, reply_to: ReplySlot) -> Self {
        Self {
            channel,
            envelope,
            reply_to,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn id(&self) -> MessageId {
        self.envelope.id
    }

    pub fn action(&self) -> Option<&str> {
        self.envelope.action()
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.envelope.body
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.envelope.sent_at
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Split into the envelope and a reply handle, for handlers that need to
    /// own the body while answering later.
    pub fn into_parts(self) -> (Envelope, Reply) {
        let reply = Reply {
            message_id: self.envelope.id,
            slot: self.reply_to,
        };
        (self.envelope, reply)
    }

    pub fn reply(self, body: serde_json::Value) {
        self.into_parts().1.reply(body)
    }

    pub fn fail(self, failure: ReplyFailure) {
        self.into_parts().1.fail(failure)
    }
}

/// The answering half of a `Message`.
#[derive(Debug)]
pub struct Reply {
    message_id: MessageId,
    slot: ReplySlot,
}

impl Reply {
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn reply(self, body: serde_json::Value) {
        self.send(Ok(body));
    }

    pub fn fail(self, failure: ReplyFailure) {
        self.send(Err(failure));
    }

    pub fn send(self, result: Result<serde_json::Value, ReplyFailure>) {
        // sender が timeout 済みなら受け手はもういない
        if self.slot.send(result).is_err() {
            debug!(message_id = %self.message_id, "reply dropped, sender gone");
        }
    }
}
