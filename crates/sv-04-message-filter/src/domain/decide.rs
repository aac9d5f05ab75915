use shared_types::{RelationshipState, UserId};

/// Has the sender (whose relationship state this is) blocked `recipient`?
/// A sender without state has blocked no one.
#[must_use]
pub fn is_blocked(sender_state: Option<&RelationshipState>, recipient: UserId) -> bool {
    sender_state.map_or(false, |state| state.is_blocked(recipient))
}
