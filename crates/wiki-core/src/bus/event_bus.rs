//! EventBus - named channels, one consumer each.
//!
//! # 実装詳細
//! - HashMap<String, Registration> で channel ごとに受け手を管理
//! - std Mutex で排他制御（lock 中に await しない）
//! - 返信は oneshot、送信全体を timeout で囲む

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::consumer::Consumer;
use super::message::Message;
use crate::domain::{ConsumerId, Envelope, ErrorCode, ReplyFailure};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Upper bound on one `send`, from hand-off to reply.
    pub request_timeout_ms: u64,
    /// Messages that may wait for a busy consumer before senders block.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl BusConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("channel '{0}' already has a consumer")]
    ChannelTaken(String),
}

struct Registration {
    consumer_id: ConsumerId,
    tx: mpsc::Sender<Message>,
}

pub(crate) struct Channels {
    registrations: Mutex<HashMap<String, Registration>>,
}

impl Channels {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        // map の更新は 1 命令で完結するので poison されても中身は整合している
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn sender(&self, channel: &str) -> Option<mpsc::Sender<Message>> {
        self.lock().get(channel).map(|r| r.tx.clone())
    }

    /// Remove the registration, but only if it still belongs to `consumer_id`.
    pub(crate) fn unregister(&self, channel: &str, consumer_id: ConsumerId) {
        let mut registrations = self.lock();
        if registrations
            .get(channel)
            .is_some_and(|r| r.consumer_id == consumer_id)
        {
            registrations.remove(channel);
            info!(channel, %consumer_id, "consumer unregistered");
        }
    }
}

/// Cheap to clone; every clone talks to the same channels.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
    config: BusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            channels: Arc::new(Channels {
                registrations: Mutex::new(HashMap::new()),
            }),
            config,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Become the single receiver of `channel`.
    pub fn consumer(&self, channel: &str) -> Result<Consumer, BusError> {
        let mut registrations = self.channels.lock();
        if registrations.contains_key(channel) {
            return Err(BusError::ChannelTaken(channel.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let consumer_id = ConsumerId::generate();
        registrations.insert(channel.to_string(), Registration { consumer_id, tx });
        info!(channel, %consumer_id, "consumer registered");

        Ok(Consumer::new(
            channel.to_string(),
            consumer_id,
            rx,
            Arc::downgrade(&self.channels),
        ))
    }

    pub fn has_consumer(&self, channel: &str) -> bool {
        self.channels.lock().contains_key(channel)
    }

    /// Send with the configured timeout.
    pub async fn send(
        &self,
        channel: &str,
        envelope: Envelope,
    ) -> Result<serde_json::Value, ReplyFailure> {
        self.send_with_timeout(channel, envelope, self.config.request_timeout())
            .await
    }

    /// Deliver `envelope` to the consumer of `channel` and wait for its answer.
    ///
    /// Exactly one result comes back: the consumer's reply, its failure, or a
    /// bus failure (`NoHandlers`, `NoReply`, `Timeout`).
    pub async fn send_with_timeout(
        &self,
        channel: &str,
        envelope: Envelope,
        timeout: Duration,
    ) -> Result<serde_json::Value, ReplyFailure> {
        let message_id = envelope.id;
        let Some(tx) = self.channels.sender(channel) else {
            return Err(no_handlers(channel));
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let message = Message::new(channel.to_string(), envelope, reply_tx);

        let exchange = async {
            if tx.send(message).await.is_err() {
                return Err(no_handlers(channel));
            }
            match reply_rx.await {
                Ok(result) => result,
                Err(_) => Err(ReplyFailure::new(
                    ErrorCode::NoReply,
                    format!("{message_id} on '{channel}' was dropped without a reply"),
                )),
            }
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(channel, %message_id, ?timeout, "request timed out");
                Err(ReplyFailure::new(
                    ErrorCode::Timeout,
                    format!("no reply for {message_id} on '{channel}' within {timeout:?}"),
                ))
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn no_handlers(channel: &str) -> ReplyFailure {
    ReplyFailure::new(
        ErrorCode::NoHandlers,
        format!("no consumer on channel '{channel}'"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::Instant;

    #[tokio::test]
    async fn request_reply_roundtrip() {
        let bus = EventBus::new();
        let mut consumer = bus.consumer("echo").unwrap();

        tokio::spawn(async move {
            while let Some(message) = consumer.recv().await {
                let body = message.body().clone();
                message.reply(body);
            }
        });

        let reply = bus
            .send("echo", Envelope::new(json!({ "n": 1 })))
            .await
            .unwrap();
        assert_eq!(reply, json!({ "n": 1 }));
    }

    #[tokio::test]
    async fn failure_reaches_the_sender() {
        let bus = EventBus::new();
        let mut consumer = bus.consumer("q").unwrap();

        tokio::spawn(async move {
            let message = consumer.recv().await.unwrap();
            message.fail(ReplyFailure::db_error("boom"));
        });

        let err = bus.send("q", Envelope::new(json!({}))).await.unwrap_err();
        assert_eq!(err, ReplyFailure::db_error("boom"));
    }

    #[tokio::test]
    async fn second_consumer_is_rejected() {
        let bus = EventBus::new();
        let _first = bus.consumer("q").unwrap();
        assert!(matches!(bus.consumer("q"), Err(BusError::ChannelTaken(c)) if c == "q"));
    }

    #[tokio::test]
    async fn channel_frees_up_when_consumer_drops() {
        let bus = EventBus::new();
        let first = bus.consumer("q").unwrap();
        drop(first);
        assert!(!bus.has_consumer("q"));
        assert!(bus.consumer("q").is_ok());
    }

    #[tokio::test]
    async fn send_without_consumer_is_no_handlers() {
        let bus = EventBus::new();
        let err = bus.send("nobody", Envelope::new(json!({}))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoHandlers);
    }

    #[tokio::test]
    async fn dropped_message_is_no_reply() {
        let bus = EventBus::new();
        let mut consumer = bus.consumer("q").unwrap();

        tokio::spawn(async move {
            let message = consumer.recv().await.unwrap();
            drop(message);
            // consumer は生きたまま
            consumer.recv().await;
        });

        let err = bus.send("q", Envelope::new(json!({}))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoReply);
    }

    #[tokio::test]
    async fn silent_consumer_times_out() {
        let bus = EventBus::with_config(BusConfig {
            request_timeout_ms: 200,
            ..BusConfig::default()
        });
        let mut consumer = bus.consumer("q").unwrap();

        let hold = tokio::spawn(async move {
            // 返事をせずに握り続ける
            let message = consumer.recv().await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(message);
        });

        let start = Instant::now();
        let err = bus.send("q", Envelope::new(json!({}))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(200));
        hold.abort();
    }

    #[tokio::test]
    async fn replies_go_to_their_own_sender() {
        let bus = EventBus::new();
        let mut consumer = bus.consumer("q").unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Some(message) = consumer.recv().await {
                held.push(message);
                if held.len() == 2 {
                    // 逆順で返す
                    while let Some(message) = held.pop() {
                        let body = message.body().clone();
                        message.reply(body);
                    }
                }
            }
        });

        let (a, b) = tokio::join!(
            bus.send("q", Envelope::new(json!("a"))),
            bus.send("q", Envelope::new(json!("b"))),
        );
        assert_eq!(a.unwrap(), json!("a"));
        assert_eq!(b.unwrap(), json!("b"));
    }
}
