//! # Table Values
//!
//! Per-key state held by the two changelog-backed tables. Both values are
//! created lazily on the first applied event for a key and are never deleted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entities::UserId;

/// Blocked counterparts of one actor.
///
/// Stored as an ordered set so the encoded changelog value is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipState {
    pub blocked: BTreeSet<UserId>,
}

impl RelationshipState {
    #[must_use]
    pub fn is_blocked(&self, counterpart: UserId) -> bool {
        self.blocked.contains(&counterpart)
    }
}

/// Whether one word is currently denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensorState {
    pub denied: bool,
}
