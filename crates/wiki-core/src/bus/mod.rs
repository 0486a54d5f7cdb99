//! Bus - in-process, point-to-point request/reply channels.
//!
//! - `EventBus::consumer(channel)` で受け手を 1 つだけ登録
//! - `EventBus::send(channel, envelope)` は必ず 1 回だけ結果を返す
//!
//! Each channel has at most one live `Consumer`. A send hands the envelope to
//! that consumer together with a oneshot reply slot; the receiving side answers
//! through `Message::reply` / `Message::fail`, both of which consume the
//! message, so a second answer cannot be written.

pub mod consumer;
pub mod event_bus;
pub mod message;

pub use self::consumer::Consumer;
pub use self::event_bus::{BusConfig, BusError, EventBus};
pub use self::message::{Message, Reply};
