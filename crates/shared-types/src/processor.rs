//! # Processor Identifiers
//!
//! Every independently scheduled unit of the pipeline, following the
//! `sv-NN` naming convention of the workspace crates.

use std::fmt;

/// Processor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorId {
    /// SV-02: Relationship table owner
    RelationshipTable = 2,
    /// SV-03: Deny-word table owner
    DenyWordTable = 3,
    /// SV-04: Message filter
    MessageFilter = 4,
    /// SV-04: Sender re-keying stage in front of the filter
    Rekey = 40,
}

impl ProcessorId {
    /// Crate-style name, also used as the log prefix.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RelationshipTable => "sv-02-relationship-table",
            Self::DenyWordTable => "sv-03-deny-word-table",
            Self::MessageFilter => "sv-04-message-filter",
            Self::Rekey => "sv-04-rekey",
        }
    }

    /// Short tag printed in bracketed log prefixes, e.g. `[sv-02]`.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RelationshipTable => "sv-02",
            Self::DenyWordTable => "sv-03",
            Self::MessageFilter => "sv-04",
            Self::Rekey => "sv-04/rekey",
        }
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
