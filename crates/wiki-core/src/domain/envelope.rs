//! Envelope - what actually travels over the bus.
//!
//! Routing metadata lives in `headers`, the payload in `body`. The action is
//! deliberately a header: handlers never see it inside their payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::Action;
use super::ids::MessageId;

/// Header that selects the handler on the receiving side.
pub const ACTION_HEADER: &str = "action";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: MessageId,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl Envelope {
    /// A new envelope without any headers.
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            id: MessageId::generate(),
            headers: BTreeMap::new(),
            body,
            sent_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_action(self, action: Action) -> Self {
        self.with_header(ACTION_HEADER, action.as_str())
    }

    /// Raw `action` header, if any.
    pub fn action(&self) -> Option<&str> {
        self.headers.get(ACTION_HEADER).map(String::as_str)
    }
}
