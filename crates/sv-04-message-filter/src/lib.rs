//! # SV-04 Message Filter
//!
//! Joins the relationship table and looks up the deny-word table against
//! the message stream.
//!
//! ```text
//! messages (key=recipient) ──→ [Repartitioner] ──→ messages-by-sender (key=sender)
//!                                                         │
//!        blocked-users-table ──join(sender)──→ [MessageFilter] ←──lookup(word)── deny-words-table
//!                                                         │
//!                                                         ↓
//!                                     filtered-messages (key=recipient)
//! ```
//!
//! Both tables are read through [`shared_bus::TableReader`] views that the
//! runtime materializes from the owners' changelogs. The filter never
//! writes to them.

pub mod domain;
pub mod error;
pub mod metrics;
pub mod rekey;
pub mod service;
mod workers;

pub use domain::{is_blocked, redact, Redaction};
pub use error::FilterError;
pub use metrics::{FilterMetrics, FilterMetricsSnapshot};
pub use rekey::Repartitioner;
pub use service::{MessageFilter, Outcome};
