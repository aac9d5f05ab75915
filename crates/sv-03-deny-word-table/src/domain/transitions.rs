use shared_bus::Transition;
use shared_types::{CensorEvent, CensorState};

/// Set the word's flag to what the event asks for. Unknown words start out
/// permitted.
#[must_use]
pub fn apply(current: Option<&CensorState>, event: &CensorEvent) -> Transition<CensorState> {
    let (denied, action) = match event {
        CensorEvent::Deny { .. } => (true, "denied"),
        CensorEvent::Permit { .. } => (false, "permitted"),
    };

    if current.copied().unwrap_or_default().denied == denied {
        return Transition::Unchanged;
    }
    Transition::Changed {
        state: CensorState { denied },
        action,
        subject: event.word().to_string(),
    }
}
