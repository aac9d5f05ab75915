//! # Filter Domain
//!
//! The two pure decisions the filter makes per message: which words to
//! redact, and whether the sender is blocked by the recipient.

pub mod decide;
pub mod redact;

pub use decide::is_blocked;
pub use redact::{redact, Redaction};
