//! # Stream Events
//!
//! One closed, tagged variant per input stream. The `action` tag selects
//! the variant; an unknown tag is a decode error and the record is dropped.

use serde::{Deserialize, Serialize};

use crate::entities::UserId;

/// Events on the `blocked-users` stream, keyed by actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelationshipEvent {
    /// `actor` stops receiving messages from `counterpart`.
    Block { actor: UserId, counterpart: UserId },
    /// `actor` lifts an earlier block on `counterpart`.
    Unblock { actor: UserId, counterpart: UserId },
}

impl RelationshipEvent {
    /// The user acting on their own relationship set.
    #[must_use]
    pub fn actor(&self) -> UserId {
        match self {
            Self::Block { actor, .. } | Self::Unblock { actor, .. } => *actor,
        }
    }

    /// The user being blocked or unblocked.
    #[must_use]
    pub fn counterpart(&self) -> UserId {
        match self {
            Self::Block { counterpart, .. } | Self::Unblock { counterpart, .. } => *counterpart,
        }
    }

    /// Routing key on the `blocked-users` stream.
    #[must_use]
    pub fn routing_key(&self) -> String {
        self.actor().routing_key()
    }

    /// True when a user targets themselves. Such events are never applied.
    #[must_use]
    pub fn is_self_referential(&self) -> bool {
        self.actor() == self.counterpart()
    }

    /// Short name used in structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Block { .. } => "block",
            Self::Unblock { .. } => "unblock",
        }
    }
}

/// Events on the `deny-words` stream, keyed by word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CensorEvent {
    /// Redact `word` from now on.
    Deny { word: String },
    /// Stop redacting `word`.
    Permit { word: String },
}

impl CensorEvent {
    /// The exact, case-sensitive word this event targets.
    #[must_use]
    pub fn word(&self) -> &str {
        match self {
            Self::Deny { word } | Self::Permit { word } => word,
        }
    }

    /// Routing key on the `deny-words` stream.
    #[must_use]
    pub fn routing_key(&self) -> String {
        self.word().to_string()
    }

    /// Short name used in structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deny { .. } => "deny",
            Self::Permit { .. } => "permit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_event_wire_form() {
        let event = RelationshipEvent::Block {
            actor: UserId(1),
            counterpart: UserId(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "block", "actor": 1, "counterpart": 2})
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        let raw = r#"{"action":"mute","actor":1,"counterpart":2}"#;
        assert!(serde_json::from_str::<RelationshipEvent>(raw).is_err());
    }

    #[test]
    fn test_self_referential() {
        let event = RelationshipEvent::Unblock {
            actor: UserId(5),
            counterpart: UserId(5),
        };
        assert!(event.is_self_referential());
        assert_eq!(event.routing_key(), "5");
    }

    #[test]
    fn test_censor_event_accessors() {
        let event = CensorEvent::Deny {
            word: "Bad".to_string(),
        };
        assert_eq!(event.word(), "Bad");
        assert_eq!(event.routing_key(), "Bad");
        assert_eq!(event.kind(), "deny");
    }
}
