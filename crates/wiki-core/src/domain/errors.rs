//! Errors - the failure half of a bus reply.
//!
//! Both sides of the bus share `ErrorCode`, so a caller can branch on the
//! cause without parsing messages. Codes 0..=2 are the protocol/database codes
//! the web front end has always understood; the rest are raised by the bus
//! itself.

use serde::{Deserialize, Serialize};

/// Closed, numbered failure space. Discriminants are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum ErrorCode {
    /// The envelope had no `action` header.
    NoActionSpecified = 0,
    /// The `action` header named nothing registered.
    BadAction = 1,
    /// The store failed while handling the request.
    DbError = 2,
    /// The body did not decode into the request the action expects.
    BadPayload = 3,
    /// Nobody is listening on the channel.
    NoHandlers = 4,
    /// No reply arrived within the send timeout.
    Timeout = 5,
    /// The receiver dropped the message without answering.
    NoReply = 6,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Failures caused by the request itself (header or body), not by the
    /// service answering it. The store is never touched for these.
    pub fn is_protocol(self) -> bool {
        matches!(
            self,
            ErrorCode::NoActionSpecified | ErrorCode::BadAction | ErrorCode::BadPayload
        )
    }
}

/// A typed failure reply: `(code, message)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{code:?}/{}] {message}", .code.as_u16())]
pub struct ReplyFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl ReplyFailure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn no_action_specified() -> Self {
        Self::new(ErrorCode::NoActionSpecified, "No action header specified")
    }

    pub fn bad_action(action: &str) -> Self {
        Self::new(ErrorCode::BadAction, format!("Bad action: {action}"))
    }

    pub fn db_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DbError, message)
    }

    pub fn bad_payload(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadPayload, message)
    }
}
