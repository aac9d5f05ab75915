//! # Core Domain Entities
//!
//! Users and the messages they exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Replacement written over every denied word.
pub const REDACTION_MARKER: &str = "***";

/// Registry subject under which the message schema is registered.
pub const MESSAGE_SCHEMA_SUBJECT: &str = "messages-value";

/// JSON-Schema document describing [`Message`] on the wire.
pub const MESSAGE_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "properties": {
    "user_id": { "type": "integer", "format": "int64" },
    "recipient_id": { "type": "integer", "format": "int64" },
    "message": { "type": "string" },
    "created_at": { "type": "string", "format": "date-time" }
  },
  "required": ["user_id", "recipient_id", "message", "created_at"]
}"#;

/// Identifier of a user.
///
/// The routing-key form is the decimal string (`UserId(42)` → `"42"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Key used to route records about this user.
    #[must_use]
    pub fn routing_key(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(UserId)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        UserId(value)
    }
}

/// A direct message between two users.
///
/// Field names on the wire follow [`MESSAGE_SCHEMA`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    #[serde(rename = "user_id")]
    pub sender_id: UserId,
    /// Addressee of the message.
    pub recipient_id: UserId,
    /// Free text body. Rewritten in place by the filter.
    #[serde(rename = "message")]
    pub body: String,
    /// Creation time as stamped by the emitter.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(sender_id: UserId, recipient_id: UserId, body: impl Into<String>) -> Self {
        Self {
            sender_id,
            recipient_id,
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Key the inbound `messages` stream is partitioned by.
    #[must_use]
    pub fn inbound_key(&self) -> String {
        self.recipient_id.routing_key()
    }

    /// Key the relationship join must be evaluated at.
    #[must_use]
    pub fn join_key(&self) -> String {
        self.sender_id.routing_key()
    }
}
