//! Strongly-typed identifiers for bus traffic.
//!
//! ULID ベースの ID を Phantom type でラップしています。
//! `MessageId` と `ConsumerId` は同じ表現ですが、型としては混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait providing the display prefix of an id type.
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed id. `T` only exists at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// A fresh id stamped with the current time.
    pub fn generate() -> Self {
        Self {
            ulid: Ulid::new(),
            _marker: PhantomData,
        }
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Message のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {}

impl IdMarker for Message {
    fn prefix() -> &'static str {
        "msg-"
    }
}

/// Consumer のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Consumer {}

impl IdMarker for Consumer {
    fn prefix() -> &'static str {
        "consumer-"
    }
}

/// Identifier of one request travelling over the bus.
pub type MessageId = Id<Message>;

/// Identifier of one channel registration.
pub type ConsumerId = Id<Consumer>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_their_prefix() {
        let message = MessageId::generate();
        let consumer = ConsumerId::generate();

        assert!(message.to_string().starts_with("msg-"));
        assert!(consumer.to_string().starts_with("consumer-"));
        // let _: MessageId = consumer; // <- does not compile
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let id1 = MessageId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = MessageId::generate();

        assert!(id1 < id2);
    }

    #[test]
    fn ids_survive_json() {
        let id = MessageId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
