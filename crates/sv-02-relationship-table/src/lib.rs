//! # SV-02 Relationship Table
//!
//! Owns the `blocked-users` group table: for every actor, the set of users
//! whose messages to that actor are dropped by the filter.
//!
//! ## Flow
//!
//! ```text
//! blocked-users (key=actor) ──→ [admit] ──→ [apply] ──→ blocked-users-table
//!                                  │           │          (changelog)
//!                           self-block /    no-op when
//!                           wrong key       already (un)blocked
//! ```
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | No self-block | `admit` rejects actor == counterpart before any state read |
//! | Idempotent | Block of a present / Unblock of an absent counterpart is `Unchanged` |
//! | Single key | `admit` rejects events whose actor is not the record key |
//! | Never destroyed | Unblocking the last counterpart persists an empty set |

pub mod domain;
pub mod service;

pub use domain::apply;
pub use service::{relationship_group, RelationshipProcessor};
