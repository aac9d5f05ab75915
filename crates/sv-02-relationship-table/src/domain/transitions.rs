//! # Relationship Transitions
//!
//! Set semantics over the blocked counterparts of one actor.

use shared_bus::Transition;
use shared_types::{RelationshipEvent, RelationshipState};

/// Apply a block/unblock event to the actor's current state.
///
/// A missing state is treated as the empty set and only materialized when
/// the event changes it.
#[must_use]
pub fn apply(
    current: Option<&RelationshipState>,
    event: &RelationshipEvent,
) -> Transition<RelationshipState> {
    let counterpart = event.counterpart();
    let mut state = current.cloned().unwrap_or_default();

    let (changed, action) = match event {
        RelationshipEvent::Block { .. } => (state.blocked.insert(counterpart), "blocked"),
        RelationshipEvent::Unblock { .. } => (state.blocked.remove(&counterpart), "unblocked"),
    };

    if changed {
        Transition::Changed {
            state,
            action,
            subject: counterpart.to_string(),
        }
    } else {
        Transition::Unchanged
    }
}
